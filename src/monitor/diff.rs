// src/monitor/diff.rs

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerDiff {
    /// `current \ previous`, in the order of `current`.
    pub joined: Vec<String>,
    /// `previous \ current`, in the order of `previous`.
    pub left: Vec<String>,
}

pub fn diff(previous: &[String], current: &[String]) -> PlayerDiff {
    PlayerDiff {
        joined: difference(current, previous),
        left: difference(previous, current),
    }
}

fn difference(from: &[String], without: &[String]) -> Vec<String> {
    from.iter()
        .filter(|name| !without.contains(name))
        .cloned()
        .collect()
}
