use crate::model::{Partition, UsageEvent};
use std::collections::BTreeMap;

/// Group normalized events into report partitions.
///
/// With `split_ferry` both the ferry and the other partition are always
/// present, so the workbook layout does not depend on the month's data.
pub fn split(events: Vec<UsageEvent>, split_ferry: bool) -> BTreeMap<Partition, Vec<UsageEvent>> {
    let mut partitions = BTreeMap::new();
    if !split_ferry {
        partitions.insert(Partition::All, events);
        return partitions;
    }

    partitions.insert(Partition::Ferry, Vec::new());
    partitions.insert(Partition::Other, Vec::new());
    for event in events {
        partitions
            .entry(event.partition)
            .or_insert_with(Vec::new)
            .push(event);
    }
    partitions
}
