use crate::colormap::ThresholdTable;

/// One swatch of the legend: a bucket color and the depth range it covers.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub color: &'static str,
    pub label: String,
}

/// Builds one entry per bucket, in table order. Adjacent bounds form a
/// `"{low}–{high}"` range and the open-ended last bucket reads `"{low}+"`.
pub fn build_legend(table: &ThresholdTable) -> Vec<LegendEntry> {
    table
        .iter()
        .enumerate()
        .map(|(i, threshold)| {
            let label = match table.get(i + 1) {
                Some(next) => format!("{}\u{2013}{}", threshold.lower_bound, next.lower_bound),
                None => format!("{}+", threshold.lower_bound),
            };
            LegendEntry {
                color: threshold.color,
                label,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colormap::{Threshold, LEGEND_THRESHOLDS, MARKER_THRESHOLDS};
    use pretty_assertions::assert_eq;

    #[test]
    fn one_entry_per_threshold() {
        assert_eq!(build_legend(LEGEND_THRESHOLDS).len(), LEGEND_THRESHOLDS.len());
        assert_eq!(build_legend(MARKER_THRESHOLDS).len(), MARKER_THRESHOLDS.len());
    }

    #[test]
    fn labels_follow_table_order() {
        let labels = build_legend(LEGEND_THRESHOLDS)
            .into_iter()
            .map(|entry| entry.label)
            .collect::<Vec<_>>();
        assert_eq!(
            labels,
            vec!["-10–10", "10–30", "30–50", "50–70", "70–90", "90+"]
        );
    }

    #[test]
    fn first_and_last_entries() {
        let legend = build_legend(LEGEND_THRESHOLDS);
        assert_eq!(
            legend[0],
            LegendEntry {
                color: "#98ee00",
                label: "-10–10".to_string(),
            }
        );
        assert_eq!(
            legend[5],
            LegendEntry {
                color: "#ea2c2c",
                label: "90+".to_string(),
            }
        );
    }

    #[test]
    fn last_entry_is_open_ended() {
        let table = [Threshold::new(0.0, "#111"), Threshold::new(2.5, "#222")];
        let legend = build_legend(&table);
        assert_eq!(legend[0].label, "0–2.5");
        assert_eq!(legend[1].label, "2.5+");

        let single = build_legend(&[Threshold::new(7.0, "#333")]);
        assert_eq!(single[0].label, "7+");
    }

    #[test]
    fn rebuilding_is_idempotent() {
        assert_eq!(build_legend(LEGEND_THRESHOLDS), build_legend(LEGEND_THRESHOLDS));
    }
}
