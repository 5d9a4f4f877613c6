use super::snapshot::TokenNetworkView;

#[derive(Clone, Debug, Default)]
pub struct NetworkCatalog {
    networks: Vec<TokenNetworkView>,
    current: Option<String>,
}

impl NetworkCatalog {
    /// Replaces the catalog contents. A lone network is always browsable;
    /// otherwise networks without open channels are hidden. The current token
    /// stays selected when it survives the refresh.
    pub fn update(&mut self, networks: &[TokenNetworkView]) {
        self.networks = if networks.len() == 1 {
            networks.to_vec()
        } else {
            networks
                .iter()
                .filter(|view| view.summary.opened_channels > 0)
                .cloned()
                .collect()
        };

        let still_present = self
            .current
            .as_deref()
            .is_some_and(|token| self.index_of(token).is_some());
        if !still_present {
            self.current = self
                .networks
                .first()
                .map(|view| view.summary.token.address.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    pub fn networks(&self) -> &[TokenNetworkView] {
        &self.networks
    }

    pub fn current(&self) -> Option<&TokenNetworkView> {
        self.current.as_deref().and_then(|token| self.find(token))
    }

    pub fn find(&self, token_address: &str) -> Option<&TokenNetworkView> {
        self.index_of(token_address).map(|index| &self.networks[index])
    }

    pub fn select(&mut self, token_address: &str) -> bool {
        if self.index_of(token_address).is_some() {
            self.current = Some(token_address.to_owned());
            true
        } else {
            false
        }
    }

    pub fn next(&mut self) -> Option<&str> {
        let index = self.current_index()?;
        let next = self.networks.get(index + 1)?;
        self.current = Some(next.summary.token.address.clone());
        self.current.as_deref()
    }

    pub fn previous(&mut self) -> Option<&str> {
        let index = self.current_index()?.checked_sub(1)?;
        self.current = Some(self.networks[index].summary.token.address.clone());
        self.current.as_deref()
    }

    fn current_index(&self) -> Option<usize> {
        self.current.as_deref().and_then(|token| self.index_of(token))
    }

    fn index_of(&self, token_address: &str) -> Option<usize> {
        self.networks
            .iter()
            .position(|view| view.summary.token.address == token_address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::snapshot::process_snapshot;
    use crate::metrics::snapshot::tests::{raw_network, raw_snapshot, sample_document};
    use serde_json::json;

    #[test]
    fn hides_inactive_networks_when_there_are_several() {
        let snapshot = process_snapshot(sample_document()).expect("snapshot");
        let mut catalog = NetworkCatalog::default();
        catalog.update(&snapshot.networks);

        assert_eq!(catalog.len(), 1);
        assert_eq!(
            catalog.current().map(|view| view.summary.token.address.as_str()),
            Some("0xbusy")
        );
        assert!(!catalog.select("0xquiet"));
    }

    #[test]
    fn single_network_is_kept_even_without_open_channels() {
        let document = raw_snapshot(vec![raw_network("0xonly", json!([]), json!({}))]);
        let snapshot = process_snapshot(document).expect("snapshot");
        let mut catalog = NetworkCatalog::default();
        catalog.update(&snapshot.networks);
        assert_eq!(catalog.len(), 1);
        assert!(catalog.find("0xonly").is_some());
    }

    #[test]
    fn navigation_stops_at_the_edges_and_survives_refresh() {
        let open = |token: &str| {
            raw_network(
                token,
                json!([{"channel_identifier": 1, "status": "opened",
                        "participant1": "0xa", "participant2": "0xb",
                        "deposit1": 1, "deposit2": 0}]),
                json!({}),
            )
        };
        let document = raw_snapshot(vec![open("0x1"), open("0x2"), open("0x3")]);
        let snapshot = process_snapshot(document).expect("snapshot");

        let mut catalog = NetworkCatalog::default();
        catalog.update(&snapshot.networks);
        assert_eq!(catalog.previous(), None);
        assert_eq!(catalog.next(), Some("0x2"));
        assert_eq!(catalog.next(), Some("0x3"));
        assert_eq!(catalog.next(), None);

        catalog.update(&snapshot.networks);
        assert_eq!(
            catalog.current().map(|view| view.summary.token.address.as_str()),
            Some("0x3")
        );
        assert_eq!(catalog.previous(), Some("0x2"));
    }
}
