//! Client-side ordering for list screens.

/// Sorts `items` by `key`, largest first, with items lacking a key at the end.
///
/// The sort is stable: items with equal keys keep their store order.
pub fn sort_desc_by_key<T, K, F>(items: &mut [T], key: F)
where
    K: Ord,
    F: Fn(&T) -> Option<K>,
{
    // `None` orders below every `Some`, so reversing the comparison puts it last.
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}
