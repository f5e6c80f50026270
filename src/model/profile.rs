#[derive(Debug, Clone, PartialEq)]
pub struct GradeBand {
    pub label: &'static str,
    /// Inclusive lower bound; the upper bound is the previous band's `min`.
    pub min: f64,
}

#[derive(Debug, Clone)]
pub struct ReportProfile {
    /// Ordered from the highest band down.
    pub grades: Vec<GradeBand>,
    pub top_n: usize,
    pub decimals: usize,
}

impl ReportProfile {
    pub fn default_v1() -> Self {
        Self {
            grades: vec![
                GradeBand { label: "A+", min: 70.0 },
                GradeBand { label: "A", min: 60.0 },
                GradeBand { label: "B+", min: 50.0 },
                GradeBand { label: "B", min: 40.0 },
                GradeBand { label: "C+", min: 30.0 },
                GradeBand { label: "C", min: 0.0 },
            ],
            top_n: 10,
            decimals: 2,
        }
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    /// Index into `grades` for `score`. Scores below the last band clamp
    /// into it.
    pub fn grade_index(&self, score: f64) -> usize {
        self.grades
            .iter()
            .position(|band| score >= band.min)
            .unwrap_or(self.grades.len().saturating_sub(1))
    }

    /// Upper bound of band `idx`, `None` for the top band.
    pub fn grade_upper(&self, idx: usize) -> Option<f64> {
        if idx == 0 {
            None
        } else {
            self.grades.get(idx - 1).map(|b| b.min)
        }
    }
}

/// Context reported next to a placed organization.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementProfile {
    pub top_performers: usize,
    /// Peers within this many points of the candidate count as similar.
    pub similar_window: f64,
    pub similar_limit: usize,
    pub regional_top: usize,
}

impl PlacementProfile {
    pub fn default_v1() -> Self {
        Self {
            top_performers: 5,
            similar_window: 5.0,
            similar_limit: 10,
            regional_top: 3,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/profile.rs"]
mod tests;
