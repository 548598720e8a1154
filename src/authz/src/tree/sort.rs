use super::ResourceView;
use std::cmp::Ordering;

/// Stable, recursive sort by sort index; nodes without one go last
pub fn sort_forest(nodes: &mut [ResourceView]) {
    nodes.sort_by(|a, b| compare_sort(a.sort, b.sort));

    let mut stack: Vec<&mut ResourceView> = nodes.iter_mut().collect();
    while let Some(node) = stack.pop() {
        node.children.sort_by(|a, b| compare_sort(a.sort, b.sort));
        stack.extend(node.children.iter_mut());
    }
}

fn compare_sort(a: Option<i32>, b: Option<i32>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_sort() {
        assert_eq!(compare_sort(Some(1), Some(2)), Ordering::Less);
        assert_eq!(compare_sort(Some(-5), None), Ordering::Less);
        assert_eq!(compare_sort(None, Some(i32::MAX)), Ordering::Greater);
        assert_eq!(compare_sort(None, None), Ordering::Equal);
        assert_eq!(compare_sort(Some(3), Some(3)), Ordering::Equal);
    }
}
