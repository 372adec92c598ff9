use crate::topology::Pair;

/// Finite points and essential births of one diagram
pub(super) struct Split {
    pub finite: Vec<Pair>,
    pub essential: Vec<f64>,
}

pub(super) fn split(pairs: &[Pair]) -> Split {
    let mut finite = Vec::with_capacity(pairs.len());
    let mut essential = Vec::new();
    for &(b, d) in pairs {
        if d.is_infinite() {
            essential.push(b);
        } else {
            finite.push((b, d));
        }
    }
    essential.sort_by(f64::total_cmp);
    Split { finite, essential }
}

/// Displacements of the sorted-birth matching between essential parts,
/// `None` when the counts differ
pub(super) fn matched_displacements(a: &[f64], b: &[f64]) -> Option<Vec<f64>> {
    if a.len() != b.len() {
        return None;
    }
    Some(a.iter().zip(b).map(|(x, y)| (x - y).abs()).collect())
}
