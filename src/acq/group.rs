use super::constants::{BPMS_PER_BOARD, NUMBER_OF_BOARDS};
use super::error::GroupError;

/// # AcqGroup
/// One AFC board and the BPMs (FMC slots) on it to acquire from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcqGroup {
    pub board: u32,
    pub bpms: Vec<u32>
}

impl AcqGroup {

    /// Parse the body of a group, `BOARD, BPM[, BPM...]`
    fn parse_body(body: &str) -> Result<Self, GroupError> {
        let mut numbers = body.split(',').map(|entry| entry.trim()).filter(|entry| !entry.is_empty());
        let board: u32 = match numbers.next() {
            Some(entry) => entry.parse()?,
            None => return Err(GroupError::Empty)
        };
        let bpms = numbers.map(|entry| entry.parse::<u32>()).collect::<Result<Vec<u32>, _>>()?;
        if bpms.is_empty() {
            return Err(GroupError::MissingBpm(body.trim().to_string()));
        }
        Ok(AcqGroup { board, bpms })
    }

    /// Parse every `[BOARD, BPM, BPM]` group in the string. A string without brackets is taken as one group.
    pub fn parse_groups(text: &str) -> Result<Vec<Self>, GroupError> {
        if !text.contains('[') {
            return Ok(vec![Self::parse_body(text)?]);
        }

        let mut groups: Vec<Self> = Vec::new();
        let mut rest = text;
        while let Some(open) = rest.find('[') {
            let after = &rest[(open + 1)..];
            let close = match after.find(']') {
                Some(c) => c,
                None => return Err(GroupError::MissingBpm(after.trim().to_string()))
            };
            groups.push(Self::parse_body(&after[..close])?);
            rest = &after[(close + 1)..];
        }
        if groups.is_empty() {
            return Err(GroupError::Empty);
        }
        Ok(groups)
    }

    /// Every board in the crate with both of its BPMs
    pub fn all_boards() -> Vec<Self> {
        (0..NUMBER_OF_BOARDS).map(|board| AcqGroup { board, bpms: BPMS_PER_BOARD.to_vec() }).collect()
    }

    /// Board 0 with both BPMs, used when no group is requested
    pub fn default_groups() -> Vec<Self> {
        vec![AcqGroup { board: 0, bpms: BPMS_PER_BOARD.to_vec() }]
    }

    /// Resolve the groups of a run from the command line selection
    pub fn select(all_boards: bool, requested: &[String]) -> Result<Vec<Self>, GroupError> {
        if all_boards {
            return Ok(Self::all_boards());
        }
        if requested.is_empty() {
            return Ok(Self::default_groups());
        }
        let mut groups: Vec<Self> = Vec::new();
        for text in requested {
            groups.extend(Self::parse_groups(text)?);
        }
        Ok(groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bracketed_groups() {
        let groups = AcqGroup::parse_groups("[3, 0, 1] [7,1]").unwrap();
        assert_eq!(groups, vec![
            AcqGroup { board: 3, bpms: vec![0, 1] },
            AcqGroup { board: 7, bpms: vec![1] },
        ]);
        assert_eq!(AcqGroup::parse_groups("5,0").unwrap(), vec![AcqGroup { board: 5, bpms: vec![0] }]);
    }

    #[test]
    fn rejects_bad_groups() {
        assert!(matches!(AcqGroup::parse_groups("[4]"), Err(GroupError::MissingBpm(_))));
        assert!(matches!(AcqGroup::parse_groups("[]"), Err(GroupError::Empty)));
        assert!(matches!(AcqGroup::parse_groups("[x, 1]"), Err(GroupError::ParsingError(_))));
        assert!(matches!(AcqGroup::parse_groups("[2, 1"), Err(GroupError::MissingBpm(_))));
    }

    #[test]
    fn selection_defaults() {
        assert_eq!(AcqGroup::select(true, &["[1,0]".to_string()]).unwrap().len(), 12);
        assert_eq!(AcqGroup::select(false, &[]).unwrap(), AcqGroup::default_groups());
        let groups = AcqGroup::select(false, &["[1,0]".to_string(), "[2,1]".to_string()]).unwrap();
        assert_eq!(groups.iter().map(|g| g.board).collect::<Vec<u32>>(), vec![1, 2]);
    }
}
