use crate::index::Posting;

/// Merge two id-sorted lists, summing frequencies of ids present in both.
pub fn merge(list1: &[Posting], list2: &[Posting]) -> Vec<Posting> {
    let mut result = Vec::with_capacity(list1.len() + list2.len());
    let (mut i, mut j) = (0, 0);

    while i < list1.len() && j < list2.len() {
        let (a, b) = (list1[i], list2[j]);
        if a.entity_id == b.entity_id {
            result.push(Posting { entity_id: a.entity_id, frequency: a.frequency + b.frequency });
            i += 1;
            j += 1;
        } else if a.entity_id < b.entity_id {
            result.push(a);
            i += 1;
        } else {
            result.push(b);
            j += 1;
        }
    }

    result.extend_from_slice(&list1[i..]);
    result.extend_from_slice(&list2[j..]);
    result
}

/// Left fold of [`merge`] over `lists` in the given order.
pub fn merge_all<L: AsRef<[Posting]>>(lists: &[L]) -> Vec<Posting> {
    match lists {
        [] => Vec::new(),
        [only] => only.as_ref().to_vec(),
        [first, rest @ ..] => rest
            .iter()
            .fold(first.as_ref().to_vec(), |acc, list| merge(&acc, list.as_ref())),
    }
}
