use std::cmp::Ordering;

use indexmap::IndexSet;

use super::model::{AccountChannels, Channel, ChannelStatus, RawTokenNetwork, Token};
use super::token::to_decimal;

pub const TOP_LIMIT: usize = 5;

#[derive(Clone, Debug, PartialEq)]
pub struct ChannelDeposit {
    pub identifier: u64,
    pub participant1: String,
    pub participant2: String,
    pub deposit1: f64,
    pub deposit2: f64,
}

impl ChannelDeposit {
    fn from_channel(channel: &Channel, decimals: u32) -> Self {
        Self {
            identifier: channel.identifier,
            participant1: channel.participant1.clone(),
            participant2: channel.participant2.clone(),
            deposit1: to_decimal(channel.deposit1, decimals),
            deposit2: to_decimal(channel.deposit2, decimals),
        }
    }

    pub fn capacity(&self) -> f64 {
        self.deposit1 + self.deposit2
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TokenNetworkSummary {
    pub address: String,
    pub token: Token,
    pub opened_channels: usize,
    pub closed_channels: usize,
    pub settled_channels: usize,
    /// Participants of opened channels, in first-encounter order.
    pub unique_participants: Vec<String>,
    pub participants_with_open_channels: usize,
    /// Every account with at least one open channel, in map order.
    pub open_channels_by_account: Vec<AccountChannels>,
    pub top_channels_by_deposit: Vec<ChannelDeposit>,
    pub top_participants_by_channels: Vec<AccountChannels>,
    pub total_deposits: f64,
    pub average_deposit_per_channel: f64,
    pub average_deposit_per_participant: f64,
    pub average_channels_per_participant: f64,
}

impl TokenNetworkSummary {
    pub fn total_channels(&self) -> usize {
        self.opened_channels + self.closed_channels + self.settled_channels
    }

    pub fn channels_with_status(&self, status: ChannelStatus) -> usize {
        match status {
            ChannelStatus::Opened => self.opened_channels,
            ChannelStatus::Closed => self.closed_channels,
            ChannelStatus::Settled => self.settled_channels,
        }
    }
}

/// Stable descending top-k: equal keys keep their input order.
pub fn top_k_by_key<T, F>(items: impl IntoIterator<Item = T>, limit: usize, key: F) -> Vec<T>
where
    F: Fn(&T) -> f64,
{
    let mut ranked = items.into_iter().collect::<Vec<_>>();
    ranked.sort_by(|a, b| descending(key(a), key(b)));
    ranked.truncate(limit);
    ranked
}

fn descending(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

fn ratio(total: f64, count: usize) -> f64 {
    if count == 0 { 0.0 } else { total / count as f64 }
}

pub fn aggregate_network(network: &RawTokenNetwork) -> TokenNetworkSummary {
    let decimals = network.token.decimals;

    let mut opened = Vec::new();
    let mut closed_channels = 0usize;
    let mut settled_channels = 0usize;
    for channel in &network.channels {
        match channel.status {
            ChannelStatus::Opened => opened.push(channel),
            ChannelStatus::Closed => closed_channels += 1,
            ChannelStatus::Settled => settled_channels += 1,
        }
    }

    let mut unique_participants = IndexSet::new();
    let mut total_open_raw = 0u128;
    for channel in &opened {
        unique_participants.insert(channel.participant1.clone());
        unique_participants.insert(channel.participant2.clone());
        total_open_raw = total_open_raw.saturating_add(channel.combined_deposit());
    }

    let accounts_with_open_channels = network
        .nodes
        .iter()
        .filter(|(_, counts)| counts.opened > 0)
        .map(|(address, counts)| AccountChannels {
            address: address.clone(),
            channels: u64::from(counts.opened),
        })
        .collect::<Vec<_>>();
    let participants_with_open_channels = accounts_with_open_channels.len();
    let open_channel_ends = accounts_with_open_channels
        .iter()
        .map(|account| account.channels)
        .sum::<u64>();

    let top_participants_by_channels = top_k_by_key(
        accounts_with_open_channels.iter().cloned(),
        TOP_LIMIT,
        |account| account.channels as f64,
    );

    let top_channels_by_deposit = top_k_by_key(
        opened
            .iter()
            .map(|channel| ChannelDeposit::from_channel(channel, decimals)),
        TOP_LIMIT,
        ChannelDeposit::capacity,
    )
    .into_iter()
    .filter(|channel| channel.capacity() > 0.0)
    .collect();

    let total_deposits = to_decimal(total_open_raw, decimals);

    TokenNetworkSummary {
        address: network.address.clone(),
        token: network.token.clone(),
        opened_channels: opened.len(),
        closed_channels,
        settled_channels,
        unique_participants: unique_participants.into_iter().collect(),
        participants_with_open_channels,
        open_channels_by_account: accounts_with_open_channels,
        top_channels_by_deposit,
        top_participants_by_channels,
        total_deposits,
        average_deposit_per_channel: ratio(total_deposits, opened.len()),
        average_deposit_per_participant: ratio(total_deposits, participants_with_open_channels),
        average_channels_per_participant: ratio(
            open_channel_ends as f64,
            participants_with_open_channels,
        ),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use indexmap::IndexMap;
    use proptest::prelude::*;

    use super::*;
    use crate::metrics::model::ParticipantChannels;

    pub(crate) fn token(decimals: u32) -> Token {
        Token {
            address: "0xtoken".into(),
            name: "Test Token".into(),
            symbol: "TTT".into(),
            decimals,
        }
    }

    pub(crate) fn channel(
        identifier: u64,
        (p1, p2): (&str, &str),
        status: ChannelStatus,
        deposits: (u128, u128),
    ) -> Channel {
        Channel {
            identifier,
            status,
            participant1: p1.into(),
            participant2: p2.into(),
            deposit1: deposits.0,
            deposit2: deposits.1,
        }
    }

    pub(crate) fn counts(opened: u32, closed: u32, settled: u32) -> ParticipantChannels {
        ParticipantChannels {
            opened,
            closed,
            settled,
            online: None,
        }
    }

    pub(crate) fn network(
        decimals: u32,
        channels: Vec<Channel>,
        nodes: Vec<(&str, ParticipantChannels)>,
    ) -> RawTokenNetwork {
        RawTokenNetwork {
            address: "0xnetwork".into(),
            token: token(decimals),
            num_channels_total: channels.len() as f64,
            num_channels_opened: 0.0,
            num_channels_closed: 0.0,
            num_channels_settled: 0.0,
            channels,
            nodes: nodes
                .into_iter()
                .map(|(address, counts)| (address.to_owned(), counts))
                .collect::<IndexMap<_, _>>(),
        }
    }

    #[test]
    fn two_channel_example() {
        let raw = network(
            0,
            vec![
                channel(1, ("A", "B"), ChannelStatus::Opened, (100, 0)),
                channel(2, ("B", "C"), ChannelStatus::Closed, (0, 0)),
            ],
            vec![
                ("A", counts(1, 0, 0)),
                ("B", counts(1, 1, 0)),
                ("C", counts(0, 1, 0)),
            ],
        );

        let summary = aggregate_network(&raw);
        assert_eq!(summary.opened_channels, 1);
        assert_eq!(summary.closed_channels, 1);
        assert_eq!(summary.settled_channels, 0);
        assert_eq!(summary.unique_participants, vec!["A", "B"]);
        assert_eq!(summary.top_channels_by_deposit.len(), 1);
        assert_eq!(summary.top_channels_by_deposit[0].participant1, "A");
        assert_eq!(summary.top_channels_by_deposit[0].participant2, "B");
        assert_eq!(summary.top_channels_by_deposit[0].capacity(), 100.0);
        assert_eq!(summary.average_deposit_per_channel, 100.0);
        assert_eq!(summary.average_deposit_per_participant, 50.0);
        assert_eq!(summary.total_deposits, 100.0);
    }

    #[test]
    fn empty_network_is_all_zero() {
        let summary = aggregate_network(&network(18, Vec::new(), Vec::new()));
        assert_eq!(summary.total_channels(), 0);
        assert!(summary.unique_participants.is_empty());
        assert!(summary.top_channels_by_deposit.is_empty());
        assert!(summary.top_participants_by_channels.is_empty());
        assert_eq!(summary.average_deposit_per_channel, 0.0);
        assert_eq!(summary.average_deposit_per_participant, 0.0);
        assert_eq!(summary.average_channels_per_participant, 0.0);
    }

    #[test]
    fn closed_only_network_has_finite_averages() {
        let summary = aggregate_network(&network(
            2,
            vec![channel(1, ("A", "B"), ChannelStatus::Settled, (500, 500))],
            vec![("A", counts(0, 0, 1)), ("B", counts(0, 0, 1))],
        ));
        assert_eq!(summary.average_deposit_per_channel, 0.0);
        assert_eq!(summary.average_deposit_per_participant, 0.0);
        assert!(summary.unique_participants.is_empty());
        assert_eq!(summary.participants_with_open_channels, 0);
    }

    #[test]
    fn deposit_ranking_uses_open_channels_and_drops_empty_ones() {
        let summary = aggregate_network(&network(
            1,
            vec![
                channel(1, ("A", "B"), ChannelStatus::Opened, (0, 0)),
                channel(2, ("A", "C"), ChannelStatus::Closed, (9_000, 0)),
                channel(3, ("B", "C"), ChannelStatus::Opened, (10, 20)),
                channel(4, ("C", "D"), ChannelStatus::Opened, (15, 15)),
                channel(5, ("D", "E"), ChannelStatus::Opened, (40, 0)),
            ],
            Vec::new(),
        ));

        let identifiers = summary
            .top_channels_by_deposit
            .iter()
            .map(|channel| channel.identifier)
            .collect::<Vec<_>>();
        assert_eq!(identifiers, vec![5, 3, 4]);
        assert_eq!(summary.top_channels_by_deposit[0].capacity(), 4.0);
    }

    #[test]
    fn participant_ranking_trusts_the_supplied_counts() {
        let summary = aggregate_network(&network(
            0,
            vec![channel(1, ("A", "B"), ChannelStatus::Opened, (1, 1))],
            vec![
                ("A", counts(2, 0, 0)),
                ("B", counts(7, 0, 0)),
                ("C", counts(0, 3, 0)),
                ("D", counts(2, 0, 0)),
            ],
        ));

        let ranked = summary
            .top_participants_by_channels
            .iter()
            .map(|account| (account.address.as_str(), account.channels))
            .collect::<Vec<_>>();
        assert_eq!(ranked, vec![("B", 7), ("A", 2), ("D", 2)]);
        assert_eq!(summary.participants_with_open_channels, 3);
        assert!((summary.average_channels_per_participant - 11.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn top_k_keeps_at_most_five() {
        let ranked = top_k_by_key(0..20, TOP_LIMIT, |value| f64::from(*value));
        assert_eq!(ranked, vec![19, 18, 17, 16, 15]);
    }

    proptest! {
        #[test]
        fn top_k_is_stable_and_idempotent(scores in prop::collection::vec(0u8..4, 0..40)) {
            let items = scores.iter().copied().enumerate().collect::<Vec<_>>();
            let first = top_k_by_key(items.clone(), TOP_LIMIT, |(_, score)| f64::from(*score));
            let second = top_k_by_key(items.clone(), TOP_LIMIT, |(_, score)| f64::from(*score));
            prop_assert_eq!(&first, &second);

            for pair in first.windows(2) {
                let ((index_a, score_a), (index_b, score_b)) = (pair[0], pair[1]);
                prop_assert!(score_a >= score_b);
                if score_a == score_b {
                    prop_assert!(index_a < index_b);
                }
            }

            // A trailing duplicate of an existing tie never displaces the originals.
            if let Some(&(_, top_score)) = first.first() {
                let mut extended = items.clone();
                extended.push((usize::MAX, top_score));
                let reranked = top_k_by_key(extended, TOP_LIMIT, |(_, score)| f64::from(*score));
                let originals = reranked
                    .iter()
                    .filter(|(index, _)| *index != usize::MAX)
                    .collect::<Vec<_>>();
                let prefix = first.iter().take(originals.len()).collect::<Vec<_>>();
                prop_assert_eq!(originals, prefix);
            }
        }
    }
}
