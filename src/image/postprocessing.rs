use crate::classify::{PredictionScore, RankedPrediction};
use crate::models::LabelList;
use std::cmp::Ordering;

/// 结果排序器
pub struct ResultRanker;

impl ResultRanker {
    /// 按概率降序取前 k 个，并解析类别名
    ///
    /// 稳定排序：概率相同时保持原始下标顺序。NaN 视为最低分。
    pub fn rank(scores: &[PredictionScore], labels: &LabelList, k: usize) -> Vec<RankedPrediction> {
        let mut ordered: Vec<&PredictionScore> = scores.iter().collect();
        ordered.sort_by(|a, b| Self::descending(a.probability, b.probability));

        ordered
            .into_iter()
            .take(k)
            .map(|score| RankedPrediction {
                class_id: score.class_id,
                label: labels.resolve(score.class_id).into_owned(),
                probability: score.probability,
            })
            .collect()
    }

    fn descending(a: f32, b: f32) -> Ordering {
        let key = |v: f32| if v.is_nan() { f32::NEG_INFINITY } else { v };
        key(b).total_cmp(&key(a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::labels::FALLBACK_LABELS;

    fn scores(values: &[f32]) -> Vec<PredictionScore> {
        values
            .iter()
            .enumerate()
            .map(|(class_id, &probability)| PredictionScore { class_id, probability })
            .collect()
    }

    fn labels(names: &[&str]) -> LabelList {
        LabelList::from_names(names.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn ties_keep_original_index_order() {
        let ranked = ResultRanker::rank(
            &scores(&[0.2, 0.9, 0.9, 0.1]),
            &labels(&["a", "b", "c", "d"]),
            2,
        );

        let pairs: Vec<(&str, f32)> = ranked.iter().map(|p| (p.label.as_str(), p.probability)).collect();
        assert_eq!(pairs, vec![("b", 0.9), ("c", 0.9)]);
    }

    #[test]
    fn synthetic_label_when_index_exceeds_catalog_and_fallback() {
        let index = FALLBACK_LABELS.len() + 3;
        let mut values = vec![0.0; index + 1];
        values[index] = 0.99;

        let ranked = ResultRanker::rank(&scores(&values), &labels(&["only"]), 1);
        assert_eq!(ranked[0].label, format!("Class {}", index));
        assert_eq!(ranked[0].class_id, index);
    }

    #[test]
    fn short_catalog_defers_to_fallback_names() {
        let ranked = ResultRanker::rank(&scores(&[0.1, 0.2, 0.7]), &labels(&["first"]), 3);
        let names: Vec<&str> = ranked.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(names, vec![FALLBACK_LABELS[2], FALLBACK_LABELS[1], "first"]);
    }

    #[test]
    fn k_larger_than_scores_returns_everything_sorted() {
        let ranked = ResultRanker::rank(&scores(&[0.3, 0.5, 0.2]), &labels(&["x", "y", "z"]), 5);
        let ids: Vec<usize> = ranked.iter().map(|p| p.class_id).collect();
        assert_eq!(ids, vec![1, 0, 2]);
    }

    #[test]
    fn nan_scores_sink_to_the_bottom() {
        let ranked = ResultRanker::rank(&scores(&[f32::NAN, 0.4, 0.6]), &labels(&["x", "y", "z"]), 3);
        let ids: Vec<usize> = ranked.iter().map(|p| p.class_id).collect();
        assert_eq!(ids, vec![2, 1, 0]);
    }

    #[test]
    fn empty_scores_rank_to_nothing() {
        assert!(ResultRanker::rank(&[], &labels(&["x"]), 5).is_empty());
    }
}
