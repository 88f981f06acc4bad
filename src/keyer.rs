// ------------------------------------------------
//      ticks
// ------------------------------------------------
pub fn tick_id(pool_id: &str, tick_idx: i32) -> String {
    format!("{}#{}", pool_id, tick_idx)
}

// ------------------------------------------------
//      day / hour snapshots and position snapshots
// ------------------------------------------------
pub fn snapshot_id(subject_id: &str, index: u64) -> String {
    format!("{}#{}", subject_id, index)
}

// ------------------------------------------------
//      mints, burns and swaps
// ------------------------------------------------
pub fn pool_event_id(pool_id: &str, tx_count: u64) -> String {
    format!("{}#{}", pool_id, tx_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys() {
        assert_eq!("0xpool#-887220", tick_id("0xpool", -887220));
        assert_eq!("0xtoken#19000", snapshot_id("0xtoken", 19000));
        assert_eq!("0xpool#12", pool_event_id("0xpool", 12));
    }
}
