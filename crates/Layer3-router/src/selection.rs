//! Hybrid Tool Selection
//!
//! ```text
//! keyword score ──┐
//!                 ├─ blend (aiWeight) ─ × feedback factor ─ sort ─ topN
//! AI confidence ──┘
//! ```
//!
//! - 키워드 점수가 0 이하인 도구는 제외 (AI 추천 도구는 예외)
//! - AI 실패/저신뢰도 → 키워드만 사용
//! - 동점이면 카탈로그 순서 유지

use crate::ai::{AiProviderConfig, AiRecommendation, AiRecommender};
use crate::feedback::FeedbackStore;
use crate::keyword::{keyword_score, query_tokens};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use toolgate_foundation::config::{DEFAULT_AI_WEIGHT, DEFAULT_TOP_N};
use toolgate_foundation::SelectionSettings;
use toolgate_gateway::ToolDescriptor;
use tracing::{debug, warn};

/// 점수 출처
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// 키워드 점수만
    Keyword,
    /// AI 추천만 (키워드 점수 0)
    Ai,
    /// AI + 키워드 혼합
    Blended,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Keyword => write!(f, "keyword"),
            Provenance::Ai => write!(f, "ai"),
            Provenance::Blended => write!(f, "blended"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionCandidate {
    pub tool: ToolDescriptor,
    pub score: f64,
    pub provenance: Provenance,
}

/// Ranks a catalog for a task.
///
/// Long-lived collaborators (recommender, feedback) live here; the AI
/// provider config is supplied per call.
#[derive(Clone)]
pub struct ToolSelector {
    top_n: usize,
    ai_weight: f64,
    recommender: Option<Arc<dyn AiRecommender>>,
    feedback: Option<Arc<FeedbackStore>>,
}

impl Default for ToolSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolSelector {
    pub fn new() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            ai_weight: DEFAULT_AI_WEIGHT,
            recommender: None,
            feedback: None,
        }
    }

    pub fn from_settings(settings: &SelectionSettings) -> Self {
        Self::new()
            .with_top_n(settings.effective_top_n())
            .with_ai_weight(settings.effective_ai_weight())
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn with_ai_weight(mut self, weight: f64) -> Self {
        self.ai_weight = weight.clamp(0.0, 1.0);
        self
    }

    pub fn with_recommender(mut self, recommender: Arc<dyn AiRecommender>) -> Self {
        self.recommender = Some(recommender);
        self
    }

    pub fn with_feedback(mut self, feedback: Arc<FeedbackStore>) -> Self {
        self.feedback = Some(feedback);
        self
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    /// Rank `catalog` for `task`, best first, at most `top_n` entries.
    ///
    /// The AI is consulted only when a recommender is attached and
    /// `ai_config` is given.
    pub async fn select(
        &self,
        catalog: &[ToolDescriptor],
        task: &str,
        context: &str,
        ai_config: Option<&AiProviderConfig>,
    ) -> Vec<SelectionCandidate> {
        if catalog.is_empty() || self.top_n == 0 {
            return Vec::new();
        }

        let query = query_tokens(task, context);
        let keyword_scores: Vec<f64> = catalog.iter().map(|t| keyword_score(&query, t)).collect();

        let recommendation = match (&self.recommender, ai_config) {
            (Some(recommender), Some(config)) => {
                self.ask_ai(recommender.as_ref(), config, catalog, task, context)
                    .await
            }
            _ => None,
        };

        let mut candidates: Vec<SelectionCandidate> = catalog
            .iter()
            .zip(keyword_scores)
            .filter_map(|(tool, kw)| {
                let (score, provenance) = match &recommendation {
                    Some(rec) if rec.tool == tool.name => {
                        let blended = self.ai_weight * rec.confidence + (1.0 - self.ai_weight) * kw;
                        let provenance = if kw > 0.0 {
                            Provenance::Blended
                        } else {
                            Provenance::Ai
                        };
                        (blended, provenance)
                    }
                    _ => (kw, Provenance::Keyword),
                };
                if score <= 0.0 {
                    return None;
                }

                let factor = self
                    .feedback
                    .as_ref()
                    .map_or(1.0, |store| store.score_factor(&tool.name, task));

                Some(SelectionCandidate {
                    tool: tool.clone(),
                    score: score * factor,
                    provenance,
                })
            })
            .collect();

        // stable: ties keep catalog order
        candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        candidates.truncate(self.top_n);

        debug!(
            "Selected {} candidate(s) for task: {}",
            candidates.len(),
            candidates
                .iter()
                .map(|c| format!("{}={:.3}({})", c.tool.name, c.score, c.provenance))
                .collect::<Vec<_>>()
                .join(", ")
        );
        candidates
    }

    async fn ask_ai(
        &self,
        recommender: &dyn AiRecommender,
        config: &AiProviderConfig,
        catalog: &[ToolDescriptor],
        task: &str,
        context: &str,
    ) -> Option<AiRecommendation> {
        let rec = match recommender.recommend(config, task, context, catalog).await {
            Ok(rec) => rec,
            Err(e) => {
                warn!("AI recommendation failed, using keyword ranking: {}", e);
                return None;
            }
        };

        if rec.confidence < config.min_confidence() {
            debug!(
                "Ignoring AI pick '{}' (confidence {:.2} < {:.2})",
                rec.tool,
                rec.confidence,
                config.min_confidence()
            );
            return None;
        }
        if !catalog.iter().any(|t| t.name == rec.tool) {
            warn!("AI recommended unknown tool '{}', ignoring", rec.tool);
            return None;
        }

        Some(rec)
    }
}

impl fmt::Debug for ToolSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolSelector")
            .field("top_n", &self.top_n)
            .field("ai_weight", &self.ai_weight)
            .field("ai", &self.recommender.is_some())
            .field("feedback", &self.feedback.is_some())
            .finish()
    }
}
