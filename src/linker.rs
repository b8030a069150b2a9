//! Claim-to-behavior cross-referencing
//!
//! Interval-overlaps each claim's activity window against the derived
//! behavior windows. The relationship is strictly "co-occurs within
//! window"; nothing here asserts cause, intent, or state.

use crate::types::{
    ActivityWindow, BehaviorLink, ClaimsDocument, LinkedClaim, LinkedTopic, LinksDocument,
    WindowsDocument, CO_OCCURS, LINKS_SCHEMA,
};

/// Boundary-inclusive interval overlap
pub fn overlaps(a_start: u64, a_end: u64, b_start: u64, b_end: u64) -> bool {
    !(a_end < b_start || b_end < a_start)
}

/// Link every claim against the behavior windows.
///
/// Mode is "ordinal_window" when any window exists, else "fallback_global":
/// claims then carry explicit empty link lists rather than being omitted.
pub fn link(claims: &ClaimsDocument, windows: &WindowsDocument) -> LinksDocument {
    let ordinal_mode = !windows.behavior_windows.is_empty();
    let linking_mode = if ordinal_mode {
        "ordinal_window"
    } else {
        "fallback_global"
    };

    let mut topics: Vec<LinkedTopic> = Vec::new();

    for topic in &claims.topics {
        let mut linked: Vec<LinkedClaim> = Vec::new();

        for claim in &topic.claims {
            let mut evidence_ordinals: Vec<u64> =
                claim.evidence.iter().map(|e| e.ordinal).collect();
            evidence_ordinals.sort_unstable();
            evidence_ordinals.dedup();

            let span = match (evidence_ordinals.first(), evidence_ordinals.last()) {
                (Some(&start), Some(&end)) => Some((start, end)),
                _ => None,
            };

            let mut behavior_links: Vec<BehaviorLink> = Vec::new();
            if let (true, Some((start, end))) = (ordinal_mode, span) {
                for window in &windows.behavior_windows {
                    if overlaps(start, end, window.start_ordinal, window.end_ordinal) {
                        behavior_links.push(BehaviorLink {
                            behavior_key: window.behavior_key.clone(),
                            relationship: CO_OCCURS.to_string(),
                            claim_window: [start, end],
                            behavior_window: [window.start_ordinal, window.end_ordinal],
                        });
                    }
                }
            }

            linked.push(LinkedClaim {
                claim_id: claim.claim_id.clone(),
                normalized_text: claim.normalized_text.clone(),
                occurrence_count: claim.occurrence_count,
                first_ordinal: claim.first_ordinal,
                last_ordinal: claim.last_ordinal,
                activity_window: ActivityWindow {
                    start_ordinal: span.map(|(s, _)| s),
                    end_ordinal: span.map(|(_, e)| e),
                    evidence_ordinals,
                },
                behavior_links,
            });
        }

        linked.sort_by(|a, b| {
            let a_start = a.activity_window.start_ordinal.map(i128::from).unwrap_or(-1);
            let b_start = b.activity_window.start_ordinal.map(i128::from).unwrap_or(-1);
            a_start
                .cmp(&b_start)
                .then_with(|| a.claim_id.cmp(&b.claim_id))
        });

        topics.push(LinkedTopic {
            topic_id: topic.topic_id.clone(),
            claims: linked,
        });
    }

    LinksDocument {
        schema: LINKS_SCHEMA.to_string(),
        linking_mode: linking_mode.to_string(),
        windows_count: windows.behavior_windows.len() as u64,
        topics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        BehaviorWindow, Claim, Evidence, MarkerPresence, ModalShift, TopicClaims, CLAIMS_SCHEMA,
        WINDOWS_SCHEMA,
    };
    use pretty_assertions::assert_eq;

    fn claim_with_ordinals(ordinals: &[u64]) -> Claim {
        Claim {
            claim_id: "c1".to_string(),
            normalized_text: "a recurring statement".to_string(),
            first_ordinal: *ordinals.iter().min().unwrap_or(&0),
            last_ordinal: *ordinals.iter().max().unwrap_or(&0),
            occurrence_count: ordinals.len() as u64,
            certainty_markers: MarkerPresence {
                present: false,
                examples: Vec::new(),
            },
            intensifiers: MarkerPresence {
                present: false,
                examples: Vec::new(),
            },
            modal_shift: ModalShift {
                detected: false,
                from: "assertive".to_string(),
                to: "assertive".to_string(),
            },
            evidence: ordinals
                .iter()
                .map(|&o| Evidence {
                    quote: "a recurring statement.".to_string(),
                    id: format!("r{}", o),
                    thread_id: "t1".to_string(),
                    ordinal: o,
                })
                .collect(),
        }
    }

    fn claims_doc(claims: Vec<Claim>) -> ClaimsDocument {
        ClaimsDocument {
            schema: CLAIMS_SCHEMA.to_string(),
            ordering_policy: "input_ordinal".to_string(),
            topics: vec![TopicClaims {
                topic_id: "t1".to_string(),
                topic_label: "t1".to_string(),
                claims,
            }],
        }
    }

    fn windows_doc(spans: &[(u64, u64)]) -> WindowsDocument {
        WindowsDocument {
            schema: WINDOWS_SCHEMA.to_string(),
            behavior_windows: spans
                .iter()
                .map(|&(s, e)| BehaviorWindow {
                    behavior_key: "polarity_transition".to_string(),
                    start_ordinal: s,
                    end_ordinal: e,
                    thread_id: "t1".to_string(),
                    supporting_ids: Vec::new(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_overlap_is_boundary_inclusive() {
        assert!(overlaps(10, 20, 20, 30));
        assert!(!overlaps(10, 19, 20, 30));
        assert!(overlaps(20, 30, 10, 20));
        assert!(overlaps(5, 50, 10, 20));
    }

    #[test]
    fn test_touching_windows_link() {
        let doc = link(&claims_doc(vec![claim_with_ordinals(&[10, 20])]), &windows_doc(&[(20, 30)]));
        assert_eq!(doc.linking_mode, "ordinal_window");
        let claim = &doc.topics[0].claims[0];
        assert_eq!(claim.behavior_links.len(), 1);
        assert_eq!(claim.behavior_links[0].claim_window, [10, 20]);
        assert_eq!(claim.behavior_links[0].behavior_window, [20, 30]);
        assert_eq!(
            claim.behavior_links[0].relationship,
            "co_occurs_within_window"
        );
    }

    #[test]
    fn test_disjoint_windows_do_not_link() {
        let doc = link(&claims_doc(vec![claim_with_ordinals(&[10, 19])]), &windows_doc(&[(20, 30)]));
        assert!(doc.topics[0].claims[0].behavior_links.is_empty());
    }

    #[test]
    fn test_fallback_global_when_no_windows() {
        let doc = link(&claims_doc(vec![claim_with_ordinals(&[3])]), &windows_doc(&[]));
        assert_eq!(doc.linking_mode, "fallback_global");
        assert_eq!(doc.windows_count, 0);
        // claims still present with explicit empty link lists
        assert_eq!(doc.topics[0].claims.len(), 1);
        assert!(doc.topics[0].claims[0].behavior_links.is_empty());
    }

    #[test]
    fn test_no_evidence_means_no_window_and_no_links() {
        let doc = link(&claims_doc(vec![claim_with_ordinals(&[])]), &windows_doc(&[(0, 100)]));
        let claim = &doc.topics[0].claims[0];
        assert_eq!(claim.activity_window.start_ordinal, None);
        assert!(claim.behavior_links.is_empty());
    }

    #[test]
    fn test_evidence_ordinals_sorted_dedup() {
        let doc = link(&claims_doc(vec![claim_with_ordinals(&[7, 3, 7, 5])]), &windows_doc(&[]));
        let claim = &doc.topics[0].claims[0];
        assert_eq!(claim.activity_window.evidence_ordinals, vec![3, 5, 7]);
        assert_eq!(claim.activity_window.start_ordinal, Some(3));
        assert_eq!(claim.activity_window.end_ordinal, Some(7));
    }
}
