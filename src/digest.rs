/// Split `items` into consecutive groups of at most `max_per_batch`, keeping order.
///
/// A `max_per_batch` of zero is treated as one item per group.
pub fn batch<T>(items: Vec<T>, max_per_batch: usize) -> Vec<Vec<T>> {
    let size = max_per_batch.max(1);
    let mut groups = Vec::with_capacity(items.len().div_ceil(size));
    let mut current = Vec::with_capacity(size.min(items.len()));

    for item in items {
        current.push(item);
        if current.len() == size {
            groups.push(std::mem::replace(&mut current, Vec::with_capacity(size)));
        }
    }

    if !current.is_empty() {
        groups.push(current);
    }

    groups
}
