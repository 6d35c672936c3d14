//! 비중 제약 조건.
//!
//! 종목별 범위, 섹터 상한, 목표 수익률을 선언적으로 보관하고,
//! 솔버에 넘길 일반 선형 제약 행(`a·w = b` 또는 `a·w ≤ b`)으로 조립합니다.

use quant_core::{Asset, ConstraintConfig, QuantError, QuantResult};
use serde::{Deserialize, Serialize};

/// 실현 가능성 검사 허용 오차.
const FEASIBILITY_EPS: f64 = 1e-9;

/// 종목별 비중 범위.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssetBounds {
    pub min: f64,
    pub max: f64,
}

impl AssetBounds {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// 섹터 비중 상한.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorLimit {
    /// 섹터명
    pub sector: String,
    /// 상한 (0 ~ 1)
    pub ceiling: f64,
    /// 유니버스 내 소속 종목 인덱스
    pub members: Vec<usize>,
}

/// 선형 제약 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintKind {
    /// `a·w = b`
    Equality,
    /// `a·w ≤ b`
    UpperBound,
}

/// 일반 선형 제약 한 행.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    pub coefficients: Vec<f64>,
    pub rhs: f64,
    pub kind: ConstraintKind,
    /// 로그/에러용 이름 (예: "budget", "max:600519.SH")
    pub label: String,
}

impl LinearConstraint {
    fn equality(coefficients: Vec<f64>, rhs: f64, label: impl Into<String>) -> Self {
        Self {
            coefficients,
            rhs,
            kind: ConstraintKind::Equality,
            label: label.into(),
        }
    }

    fn upper(coefficients: Vec<f64>, rhs: f64, label: impl Into<String>) -> Self {
        Self {
            coefficients,
            rhs,
            kind: ConstraintKind::UpperBound,
            label: label.into(),
        }
    }

    /// 주어진 비중에서의 위반량 (0이면 만족).
    pub fn violation(&self, weights: &[f64]) -> f64 {
        let lhs: f64 = self
            .coefficients
            .iter()
            .zip(weights)
            .map(|(a, w)| a * w)
            .sum();
        match self.kind {
            ConstraintKind::Equality => (lhs - self.rhs).abs(),
            ConstraintKind::UpperBound => (lhs - self.rhs).max(0.0),
        }
    }
}

/// 최적화 제약 집합.
///
/// 모든 종목은 (기본값 적용 후) 범위를 가집니다. 불변식:
/// - `0 ≤ min ≤ max ≤ 1`
/// - `Σmin ≤ 1 ≤ Σmax` (섹터 상한 반영)
/// - 섹터별 소속 종목 `Σmin ≤ 상한`
/// - `target_return`과 `risk_aversion`은 동시에 설정할 수 없음
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintSet {
    assets: Vec<Asset>,
    bounds: Vec<AssetBounds>,
    sector_limits: Vec<SectorLimit>,
    target_return: Option<f64>,
    risk_aversion: Option<f64>,
}

impl ConstraintSet {
    /// 모든 종목에 같은 범위를 적용한 제약 집합.
    pub fn uniform(assets: &[Asset], min: f64, max: f64) -> Self {
        Self {
            assets: assets.to_vec(),
            bounds: vec![AssetBounds::new(min, max); assets.len()],
            sector_limits: Vec::new(),
            target_return: None,
            risk_aversion: None,
        }
    }

    /// 설정에서 제약 집합을 구성하고 실현 가능성을 검사합니다.
    ///
    /// 유니버스에 없는 종목의 범위 재정의는 무시합니다 (추세 필터로 빠졌을 수 있음).
    pub fn from_config(assets: &[Asset], config: &ConstraintConfig) -> QuantResult<Self> {
        config.validate()?;

        let mut set = Self::uniform(assets, config.min_weight, config.max_weight);

        for (symbol, overrides) in &config.asset_bounds {
            match set.index_of(symbol) {
                Some(idx) => {
                    if let Some(min) = overrides.min_weight {
                        set.bounds[idx].min = min;
                    }
                    if let Some(max) = overrides.max_weight {
                        set.bounds[idx].max = max;
                    }
                }
                None => {
                    tracing::debug!(symbol = %symbol, "Bounds override for asset outside universe");
                }
            }
        }

        let mut sectors: Vec<(&String, &f64)> = config.sector_limits.iter().collect();
        sectors.sort_by(|a, b| a.0.cmp(b.0));
        for (sector, ceiling) in sectors {
            set = set.with_sector_limit(sector.clone(), *ceiling);
        }

        set.target_return = config.target_return;
        set.risk_aversion = config.risk_aversion;

        set.validate()?;
        Ok(set)
    }

    /// 종목 범위를 재정의합니다. 유니버스에 없는 심볼은 무시됩니다.
    pub fn with_bounds(mut self, symbol: &str, min: f64, max: f64) -> Self {
        if let Some(idx) = self.index_of(symbol) {
            self.bounds[idx] = AssetBounds::new(min, max);
        }
        self
    }

    /// 섹터 상한을 추가합니다. 소속 종목은 [`Asset::sector`]로 결정됩니다.
    pub fn with_sector_limit(mut self, sector: impl Into<String>, ceiling: f64) -> Self {
        let sector = sector.into();
        let members: Vec<usize> = self
            .assets
            .iter()
            .enumerate()
            .filter(|(_, a)| a.sector.as_deref() == Some(sector.as_str()))
            .map(|(i, _)| i)
            .collect();
        if members.is_empty() {
            tracing::debug!(sector = %sector, "Sector limit has no members in universe");
        }
        self.sector_limits.retain(|l| l.sector != sector);
        self.sector_limits.push(SectorLimit {
            sector,
            ceiling,
            members,
        });
        self
    }

    pub fn with_target_return(mut self, target: f64) -> Self {
        self.target_return = Some(target);
        self
    }

    pub fn with_risk_aversion(mut self, lambda: f64) -> Self {
        self.risk_aversion = Some(lambda);
        self
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn bounds(&self) -> &[AssetBounds] {
        &self.bounds
    }

    pub fn sector_limits(&self) -> &[SectorLimit] {
        &self.sector_limits
    }

    pub fn target_return(&self) -> Option<f64> {
        self.target_return
    }

    pub fn risk_aversion(&self) -> Option<f64> {
        self.risk_aversion
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    fn index_of(&self, symbol: &str) -> Option<usize> {
        let symbol = symbol.to_uppercase();
        self.assets.iter().position(|a| a.symbol == symbol)
    }

    /// 제약 집합의 일관성과 실현 가능성을 검사합니다.
    ///
    /// # 에러
    ///
    /// - 목표수익과 위험회피 계수를 동시 설정: `Config`
    /// - 위반 종목/섹터가 있는 경우: 이름을 포함한 `InfeasibleConstraints`
    pub fn validate(&self) -> QuantResult<()> {
        if self.target_return.is_some() && self.risk_aversion.is_some() {
            return Err(QuantError::Config(
                "target_return과 risk_aversion은 동시에 설정할 수 없습니다".to_string(),
            ));
        }
        if self.assets.is_empty() {
            return Err(QuantError::InvalidInput("유니버스가 비어 있습니다".to_string()));
        }

        for (asset, b) in self.assets.iter().zip(&self.bounds) {
            if !b.min.is_finite() || !b.max.is_finite() || b.min < 0.0 || b.max > 1.0 {
                return Err(QuantError::InfeasibleConstraints(format!(
                    "{}: 비중 범위 [{}, {}]가 [0, 1]을 벗어납니다",
                    asset.symbol, b.min, b.max
                )));
            }
            if b.min > b.max {
                return Err(QuantError::InfeasibleConstraints(format!(
                    "{}: 최소 비중 {}가 최대 비중 {}보다 큽니다",
                    asset.symbol, b.min, b.max
                )));
            }
        }

        let min_sum: f64 = self.bounds.iter().map(|b| b.min).sum();
        if min_sum > 1.0 + FEASIBILITY_EPS {
            return Err(QuantError::InfeasibleConstraints(format!(
                "최소 비중 합 {:.4}가 1을 초과합니다",
                min_sum
            )));
        }

        for limit in &self.sector_limits {
            let sector_min: f64 = limit.members.iter().map(|&i| self.bounds[i].min).sum();
            if sector_min > limit.ceiling + FEASIBILITY_EPS {
                let names: Vec<&str> = limit
                    .members
                    .iter()
                    .map(|&i| self.assets[i].symbol.as_str())
                    .collect();
                return Err(QuantError::InfeasibleConstraints(format!(
                    "섹터 {}: 소속 종목 [{}]의 최소 비중 합 {:.4}가 상한 {:.4}를 초과합니다",
                    limit.sector,
                    names.join(", "),
                    sector_min,
                    limit.ceiling
                )));
            }
        }

        let max_reachable = self.max_reachable_sum();
        if max_reachable < 1.0 - FEASIBILITY_EPS {
            return Err(QuantError::InfeasibleConstraints(format!(
                "최대 비중 합 {:.4}(섹터 상한 반영)가 1에 미치지 못합니다",
                max_reachable
            )));
        }

        Ok(())
    }

    /// 섹터 상한을 반영한 도달 가능 최대 비중 합.
    ///
    /// 종목은 최대 한 섹터에 속하므로 섹터별 `min(상한, Σmax)`의 합으로 정확히 계산됩니다.
    fn max_reachable_sum(&self) -> f64 {
        let mut capped = vec![false; self.assets.len()];
        let mut total = 0.0;
        for limit in &self.sector_limits {
            let members: Vec<usize> = limit
                .members
                .iter()
                .copied()
                .filter(|&i| !capped[i])
                .collect();
            let sector_max: f64 = members.iter().map(|&i| self.bounds[i].max).sum();
            total += sector_max.min(limit.ceiling);
            for i in members {
                capped[i] = true;
            }
        }
        total
            + self
                .bounds
                .iter()
                .zip(&capped)
                .filter(|(_, &c)| !c)
                .map(|(b, _)| b.max)
                .sum::<f64>()
    }

    /// 솔버 입력용 선형 제약 행을 조립합니다.
    ///
    /// 예산(`Σw = 1`), 목표 수익(`μᵀw = target`, 주어진 경우), 종목 상·하한,
    /// 섹터 상한 순서입니다.
    pub fn linear_constraints(&self, expected: Option<&[f64]>) -> Vec<LinearConstraint> {
        let n = self.assets.len();
        let mut rows = Vec::with_capacity(2 * n + self.sector_limits.len() + 2);

        rows.push(LinearConstraint::equality(vec![1.0; n], 1.0, "budget"));

        if let (Some(target), Some(mu)) = (self.target_return, expected) {
            rows.push(LinearConstraint::equality(mu.to_vec(), target, "target_return"));
        }

        for (i, (asset, b)) in self.assets.iter().zip(&self.bounds).enumerate() {
            let mut upper = vec![0.0; n];
            upper[i] = 1.0;
            rows.push(LinearConstraint::upper(
                upper,
                b.max,
                format!("max:{}", asset.symbol),
            ));

            let mut lower = vec![0.0; n];
            lower[i] = -1.0;
            rows.push(LinearConstraint::upper(
                lower,
                -b.min,
                format!("min:{}", asset.symbol),
            ));
        }

        for limit in self.sector_limits.iter().filter(|l| !l.members.is_empty()) {
            let mut coeffs = vec![0.0; n];
            for &i in &limit.members {
                coeffs[i] = 1.0;
            }
            rows.push(LinearConstraint::upper(
                coeffs,
                limit.ceiling,
                format!("sector:{}", limit.sector),
            ));
        }

        rows
    }

    /// 비중 벡터의 불변식 위반을 확인합니다 (합, 범위, 섹터).
    ///
    /// `expected`가 주어지고 목표수익이 설정되어 있으면 `μᵀw = target`도 확인합니다.
    pub fn check_weights(
        &self,
        weights: &[f64],
        expected: Option<&[f64]>,
        tolerance: f64,
    ) -> QuantResult<()> {
        let sum: f64 = weights.iter().sum();
        if (sum - 1.0).abs() > tolerance {
            return Err(QuantError::InvalidInput(format!(
                "비중 합 {:.8}가 1이 아닙니다",
                sum
            )));
        }
        for row in self.linear_constraints(expected) {
            if row.violation(weights) > tolerance {
                return Err(QuantError::InvalidInput(format!(
                    "제약 {} 위반: {:.3e}",
                    row.label,
                    row.violation(weights)
                )));
            }
        }
        Ok(())
    }
}
