use std::collections::HashSet;
use std::sync::Arc;

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use paynet_explorer::util::short_address;
use paynet_explorer::visual::Picked;

use super::super::{SearchCache, SearchHit, ViewModel};

const MAX_SEARCH_HITS: usize = 40;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

impl ViewModel {
    /// Address prefix matches first, in draw order, then fuzzy matches on
    /// the remaining nodes' address and token symbol, best score first.
    pub(in crate::app) fn search_hits(&mut self) -> Arc<Vec<SearchHit>> {
        let query = self.search.trim().to_owned();
        if query.is_empty() {
            return Arc::default();
        }

        if let Some(cached) = &self.search_cache
            && cached.scene_revision == self.scene_revision
            && cached.query == query
        {
            return Arc::clone(&cached.hits);
        }

        let prefixed = self.scene.search(&query);
        let prefixed_nodes = prefixed
            .iter()
            .filter_map(|picked| match picked {
                Picked::Node(index) => Some(*index),
                _ => None,
            })
            .collect::<HashSet<_>>();

        let matcher = SkimMatcherV2::default();
        let mut ranked = self
            .scene
            .nodes()
            .iter()
            .enumerate()
            .filter(|(index, _)| !prefixed_nodes.contains(index))
            .filter_map(|(index, node)| {
                let text = format!("{} {}", node.data.id, node.data.token.symbol);
                fuzzy_match_score(&matcher, &text, &query).map(|score| (score, index))
            })
            .collect::<Vec<_>>();
        ranked.sort_by(|a, b| b.0.cmp(&a.0));

        let hits = prefixed
            .into_iter()
            .chain(ranked.into_iter().map(|(_, index)| Picked::Node(index)))
            .take(MAX_SEARCH_HITS)
            .filter_map(|picked| self.search_hit(picked))
            .collect::<Vec<_>>();
        let hits = Arc::new(hits);

        self.search_cache = Some(SearchCache {
            query,
            scene_revision: self.scene_revision,
            hits: Arc::clone(&hits),
        });
        hits
    }

    fn search_hit(&self, picked: Picked) -> Option<SearchHit> {
        let label = match picked {
            Picked::Node(index) => {
                let node = &self.scene.nodes().get(index)?.data;
                format!("{} ({})", short_address(&node.id), node.token.symbol)
            }
            Picked::Link(index) => {
                let link = self.scene.links().get(index)?;
                let symbol = &self.scene.nodes().get(link.source)?.data.token.symbol;
                format!(
                    "{} ↔ {} ({symbol})",
                    short_address(&link.data.source_address),
                    short_address(&link.data.target_address)
                )
            }
            Picked::None => return None,
        };
        Some(SearchHit { picked, label })
    }
}
