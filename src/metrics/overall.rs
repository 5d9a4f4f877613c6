use indexmap::{IndexMap, IndexSet};

use super::aggregate::{TOP_LIMIT, TokenNetworkSummary, top_k_by_key};
use super::model::AccountChannels;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct OverallMetrics {
    pub total_token_networks: usize,
    pub total_open_channels: usize,
    pub total_closed_channels: usize,
    pub total_settled_channels: usize,
    /// Distinct addresses across all networks; an address active in two token
    /// networks counts once here even though the graph keeps two nodes.
    pub unique_accounts: usize,
    pub top_accounts_by_channels: Vec<AccountChannels>,
    pub average_channels_per_account: f64,
}

#[derive(Default)]
struct Totals<'a> {
    networks: usize,
    opened: usize,
    closed: usize,
    settled: usize,
    accounts: IndexSet<&'a str>,
    channels_by_account: IndexMap<&'a str, u64>,
}

pub fn reduce_overall(networks: &[TokenNetworkSummary]) -> OverallMetrics {
    let totals = networks.iter().fold(Totals::default(), |mut totals, network| {
        totals.networks += 1;
        totals.opened += network.opened_channels;
        totals.closed += network.closed_channels;
        totals.settled += network.settled_channels;
        totals
            .accounts
            .extend(network.unique_participants.iter().map(String::as_str));
        for account in &network.open_channels_by_account {
            *totals
                .channels_by_account
                .entry(account.address.as_str())
                .or_insert(0) += account.channels;
        }
        totals
    });

    let open_channel_ends = totals.channels_by_account.values().sum::<u64>();
    let average_channels_per_account = if totals.channels_by_account.is_empty() {
        0.0
    } else {
        open_channel_ends as f64 / totals.channels_by_account.len() as f64
    };

    let top_accounts_by_channels = top_k_by_key(
        totals
            .channels_by_account
            .iter()
            .map(|(address, channels)| AccountChannels {
                address: (*address).to_owned(),
                channels: *channels,
            }),
        TOP_LIMIT,
        |account| account.channels as f64,
    );

    OverallMetrics {
        total_token_networks: totals.networks,
        total_open_channels: totals.opened,
        total_closed_channels: totals.closed,
        total_settled_channels: totals.settled,
        unique_accounts: totals.accounts.len(),
        top_accounts_by_channels,
        average_channels_per_account,
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::metrics::aggregate::aggregate_network;
    use crate::metrics::aggregate::tests::{channel, counts, network};
    use crate::metrics::model::ChannelStatus;

    fn summary_with(token: &str, pairs: &[(&str, &str)]) -> TokenNetworkSummary {
        let channels = pairs
            .iter()
            .enumerate()
            .map(|(index, pair)| channel(index as u64, *pair, ChannelStatus::Opened, (1, 1)))
            .collect::<Vec<_>>();

        let mut per_account = IndexMap::<&str, u32>::new();
        for (a, b) in pairs {
            *per_account.entry(a).or_insert(0) += 1;
            *per_account.entry(b).or_insert(0) += 1;
        }
        let nodes = per_account
            .into_iter()
            .map(|(address, opened)| (address, counts(opened, 0, 0)))
            .collect();

        let mut raw = network(0, channels, nodes);
        raw.token.address = token.to_owned();
        aggregate_network(&raw)
    }

    #[test]
    fn empty_input_reduces_to_zero() {
        assert_eq!(reduce_overall(&[]), OverallMetrics::default());
    }

    #[test]
    fn shared_accounts_are_counted_once() {
        let first = summary_with("0xone", &[("A", "B"), ("B", "C")]);
        let second = summary_with("0xtwo", &[("B", "D")]);

        let overall = reduce_overall(&[first, second]);
        assert_eq!(overall.total_token_networks, 2);
        assert_eq!(overall.total_open_channels, 3);
        assert_eq!(overall.unique_accounts, 4);
    }

    #[test]
    fn global_ranking_combines_networks() {
        let first = summary_with("0xone", &[("A", "B"), ("A", "C"), ("D", "E")]);
        let second = summary_with("0xtwo", &[("D", "F"), ("D", "G"), ("E", "F")]);

        let overall = reduce_overall(&[first, second]);
        let ranked = overall
            .top_accounts_by_channels
            .iter()
            .map(|account| (account.address.as_str(), account.channels))
            .collect::<Vec<_>>();
        // Per network A leads the first one, but D has the most channels overall.
        assert_eq!(ranked, vec![("D", 3), ("A", 2), ("E", 2), ("F", 2), ("B", 1)]);
    }

    #[test]
    fn status_totals_are_summed() {
        let mut raw = network(
            0,
            vec![
                channel(1, ("A", "B"), ChannelStatus::Closed, (0, 0)),
                channel(2, ("A", "B"), ChannelStatus::Settled, (0, 0)),
                channel(3, ("A", "C"), ChannelStatus::Settled, (0, 0)),
            ],
            Vec::new(),
        );
        raw.token.address = "0xthree".into();
        let overall = reduce_overall(&[aggregate_network(&raw), summary_with("0xone", &[("A", "B")])]);
        assert_eq!(overall.total_open_channels, 1);
        assert_eq!(overall.total_closed_channels, 1);
        assert_eq!(overall.total_settled_channels, 2);
        assert_eq!(overall.average_channels_per_account, 1.0);
    }

    fn address() -> impl Strategy<Value = String> {
        (0u8..8).prop_map(|index| format!("0x{index}"))
    }

    proptest! {
        #[test]
        fn unique_accounts_bounded_by_per_network_sum(
            networks in prop::collection::vec(
                prop::collection::vec((address(), address()), 0..6),
                0..5,
            )
        ) {
            let summaries = networks
                .iter()
                .enumerate()
                .map(|(index, pairs)| {
                    let pairs = pairs
                        .iter()
                        .map(|(a, b)| (a.as_str(), b.as_str()))
                        .collect::<Vec<_>>();
                    summary_with(&format!("0xtoken{index}"), &pairs)
                })
                .collect::<Vec<_>>();

            let overall = reduce_overall(&summaries);
            let per_network_sum = summaries
                .iter()
                .map(|summary| summary.unique_participants.len())
                .sum::<usize>();
            prop_assert!(overall.unique_accounts <= per_network_sum);

            let mut seen = IndexSet::new();
            let disjoint = summaries.iter().all(|summary| {
                summary
                    .unique_participants
                    .iter()
                    .all(|participant| seen.insert(participant.clone()))
            });
            prop_assert_eq!(overall.unique_accounts == per_network_sum, disjoint);
        }
    }
}
