//! Overload selection by argument capacity

use lsp_types::SignatureInformation;

use super::node::CallNode;

/// Which candidate and parameter the editor should highlight
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignatureSelection {
    pub active_signature: Option<u32>,
    pub active_parameter: Option<u32>,
}

fn parameter_count(candidate: &SignatureInformation) -> usize {
    candidate.parameters.as_ref().map_or(0, Vec::len)
}

/// Pick the first candidate, in declaration order, with room for every
/// argument seen so far.
pub fn select_signature(
    candidates: &[SignatureInformation],
    node: &CallNode,
    parameter_index: i32,
) -> SignatureSelection {
    let actual = node.argument_count().map_or(-1, |count| count as i64);
    let target = (parameter_index as i64 + 1).max(actual);

    candidates
        .iter()
        .position(|candidate| parameter_count(candidate) as i64 >= target)
        .map(|index| SignatureSelection {
            active_signature: Some(index as u32),
            active_parameter: Some(parameter_index.max(0) as u32),
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lsp_types::{ParameterInformation, ParameterLabel};

    fn candidate(parameters: usize) -> SignatureInformation {
        SignatureInformation {
            label: format!("f/{}", parameters),
            documentation: None,
            parameters: Some(
                (0..parameters)
                    .map(|i| ParameterInformation {
                        label: ParameterLabel::Simple(format!("p{}", i)),
                        documentation: None,
                    })
                    .collect(),
            ),
            active_parameter: None,
        }
    }

    fn candidates(counts: &[usize]) -> Vec<SignatureInformation> {
        counts.iter().map(|count| candidate(*count)).collect()
    }

    #[test]
    fn test_selects_candidate_matching_argument_count() {
        let selection = select_signature(
            &candidates(&[1, 2, 3]),
            &CallNode::Call { arguments: Some(2) },
            1,
        );
        assert_eq!(selection.active_signature, Some(1));
        assert_eq!(selection.active_parameter, Some(1));
    }

    #[test]
    fn test_first_fit_wins_over_best_fit() {
        let selection = select_signature(
            &candidates(&[3, 2]),
            &CallNode::Call { arguments: Some(2) },
            0,
        );
        assert_eq!(selection.active_signature, Some(0));
    }

    #[test]
    fn test_argument_count_raises_target() {
        // cursor in the first slot but three arguments already written
        let selection = select_signature(
            &candidates(&[1, 2, 3]),
            &CallNode::Call { arguments: Some(3) },
            0,
        );
        assert_eq!(selection.active_signature, Some(2));
        assert_eq!(selection.active_parameter, Some(0));
    }

    #[test]
    fn test_unknown_argument_count_uses_cursor_index() {
        let selection = select_signature(
            &candidates(&[0, 1, 2]),
            &CallNode::Call { arguments: None },
            -1,
        );
        assert_eq!(selection.active_signature, Some(0));
        assert_eq!(selection.active_parameter, Some(0));
    }

    #[test]
    fn test_member_ref_uses_declared_parameters() {
        let selection = select_signature(
            &candidates(&[1, 2]),
            &CallNode::MemberRef { parameters: 2 },
            0,
        );
        assert_eq!(selection.active_signature, Some(1));
    }

    #[test]
    fn test_block_fallback() {
        let selection = select_signature(&candidates(&[1, 3]), &CallNode::Block, 2);
        assert_eq!(selection.active_signature, Some(1));
        assert_eq!(selection.active_parameter, Some(2));
    }

    #[test]
    fn test_no_candidate_has_capacity() {
        let selection = select_signature(
            &candidates(&[1, 2]),
            &CallNode::Call { arguments: Some(3) },
            2,
        );
        assert_eq!(selection, SignatureSelection::default());
    }

    #[test]
    fn test_missing_parameter_list_counts_as_zero() {
        let mut bare = candidate(0);
        bare.parameters = None;
        let selection = select_signature(&[bare], &CallNode::Call { arguments: Some(0) }, -1);
        assert_eq!(selection.active_signature, Some(0));
    }
}
