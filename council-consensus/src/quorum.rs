//! Quorum size and proposal numbering.

/// Majority of all configured members: `floor(n/2) + 1`.
pub fn quorum_size(peer_count: usize) -> usize {
    peer_count / 2 + 1
}

/// Proposal number for a proposer's `round` (starting at 1).
///
/// Interleaving by directory position keeps numbers unique across proposers
/// and strictly increasing per proposer.
pub fn proposal_number(round: i64, node_index: usize, total_nodes: usize) -> i64 {
    round * total_nodes as i64 + node_index as i64
}
