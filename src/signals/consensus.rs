//! Majority rule across indicator votes.

use crate::models::{ConsensusSignal, SignalStrength, Vote};
use crate::signals::votes::VoteSet;

/// Votes needed for a consensus.
pub const MIN_AGREEING_VOTES: usize = 2;

/// BUY if at least two families say BUY, else SELL if at least two say SELL,
/// else NONE. Three agreeing votes are labelled strong, two weak.
pub fn consensus(votes: &VoteSet) -> (ConsensusSignal, SignalStrength) {
    let buys = votes.count(Vote::Buy);
    let sells = votes.count(Vote::Sell);

    if buys >= MIN_AGREEING_VOTES {
        (ConsensusSignal::Buy, strength(buys))
    } else if sells >= MIN_AGREEING_VOTES {
        (ConsensusSignal::Sell, strength(sells))
    } else {
        (ConsensusSignal::None, SignalStrength::None)
    }
}

fn strength(agreeing: usize) -> SignalStrength {
    if agreeing >= 3 {
        SignalStrength::Strong
    } else {
        SignalStrength::Weak
    }
}
