//! Analytics View Model
//!
//! Holds the latest summary, plot set, trend series and the two cross-tabulated
//! breakdowns. Each is replaced wholesale by a successful fetch and left exactly
//! as it was by a failed one. Nothing refreshes on its own; callers decide when
//! to fetch.

use crate::error::Result;
use crate::model::{AnalyticsSummary, DepartmentStats, MonthlyTrends, PlotSet, RootCauseStats};
use crate::sync::{HttpRequest, RequestKind, SyncCoordinator, ViewScope};
use arc_swap::ArcSwapOption;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of [`AnalyticsViewModel::refresh_all`], one result per panel
#[derive(Debug)]
pub struct AnalyticsRefresh {
    pub summary: Result<Arc<AnalyticsSummary>>,
    pub plots: Result<Arc<PlotSet>>,
    pub trends: Result<Arc<MonthlyTrends>>,
}

impl AnalyticsRefresh {
    pub fn all_succeeded(&self) -> bool {
        self.summary.is_ok() && self.plots.is_ok() && self.trends.is_ok()
    }
}

pub struct AnalyticsViewModel {
    sync: Arc<SyncCoordinator>,
    summary: ArcSwapOption<AnalyticsSummary>,
    plots: ArcSwapOption<PlotSet>,
    trends: ArcSwapOption<MonthlyTrends>,
    department_stats: ArcSwapOption<DepartmentStats>,
    root_cause_stats: ArcSwapOption<RootCauseStats>,
    scope: ViewScope,
}

impl AnalyticsViewModel {
    pub fn new(sync: Arc<SyncCoordinator>) -> Self {
        Self {
            sync,
            summary: ArcSwapOption::empty(),
            plots: ArcSwapOption::empty(),
            trends: ArcSwapOption::empty(),
            department_stats: ArcSwapOption::empty(),
            root_cause_stats: ArcSwapOption::empty(),
            scope: ViewScope::new(),
        }
    }

    pub fn summary(&self) -> Option<Arc<AnalyticsSummary>> {
        self.summary.load_full()
    }

    pub fn plots(&self) -> Option<Arc<PlotSet>> {
        self.plots.load_full()
    }

    pub fn trends(&self) -> Option<Arc<MonthlyTrends>> {
        self.trends.load_full()
    }

    pub fn department_stats(&self) -> Option<Arc<DepartmentStats>> {
        self.department_stats.load_full()
    }

    pub fn root_cause_stats(&self) -> Option<Arc<RootCauseStats>> {
        self.root_cause_stats.load_full()
    }

    pub fn scope(&self) -> &ViewScope {
        &self.scope
    }

    pub fn close(&self) {
        self.scope.close();
    }

    pub async fn fetch_summary(&self) -> Result<Arc<AnalyticsSummary>> {
        let summary: Arc<AnalyticsSummary> = self
            .load(RequestKind::FetchSummary, "/analytics/summary", &self.summary)
            .await?;
        info!("Analytics summary covers {} records", summary.total_records);
        Ok(summary)
    }

    pub async fn fetch_plots(&self) -> Result<Arc<PlotSet>> {
        let plots: Arc<PlotSet> = self
            .load(RequestKind::FetchPlots, "/analytics/plots", &self.plots)
            .await?;
        info!("Loaded {} analytics plots", plots.len());
        Ok(plots)
    }

    pub async fn fetch_trends(&self) -> Result<Arc<MonthlyTrends>> {
        let trends: Arc<MonthlyTrends> = self
            .load(RequestKind::FetchTrends, "/analytics/trends", &self.trends)
            .await?;
        info!("Loaded {} months of trends", trends.monthly_trends.len());
        Ok(trends)
    }

    /// Severity by department
    pub async fn fetch_department_stats(&self) -> Result<Arc<DepartmentStats>> {
        self.load(
            RequestKind::FetchDepartmentStats,
            "/analytics/department-stats",
            &self.department_stats,
        )
        .await
    }

    /// Root cause by equipment type
    pub async fn fetch_root_cause_stats(&self) -> Result<Arc<RootCauseStats>> {
        self.load(
            RequestKind::FetchRootCauseStats,
            "/analytics/root-cause-stats",
            &self.root_cause_stats,
        )
        .await
    }

    /// Every stored record as CSV text, exactly as the service renders it
    ///
    /// Nothing is held; an empty dataset is a 404 from the service.
    pub async fn export_csv(&self) -> Result<String> {
        let csv = self
            .sync
            .fetch_text(RequestKind::ExportCsv, HttpRequest::get("/export/csv"))
            .await?;
        info!("Exported {} bytes of CSV", csv.len());
        Ok(csv)
    }

    /// Fetch summary, plots and trends concurrently; each applies independently
    pub async fn refresh_all(&self) -> AnalyticsRefresh {
        let (summary, plots, trends) = futures::join!(
            self.fetch_summary(),
            self.fetch_plots(),
            self.fetch_trends()
        );
        AnalyticsRefresh {
            summary,
            plots,
            trends,
        }
    }

    async fn load<T: DeserializeOwned>(
        &self,
        kind: RequestKind,
        path: &str,
        slot: &ArcSwapOption<T>,
    ) -> Result<Arc<T>> {
        let value: T = self.sync.fetch(kind, HttpRequest::get(path)).await?;
        let value = Arc::new(value);

        if self.scope.is_active() {
            slot.store(Some(value.clone()));
        } else {
            debug!(kind = %kind, "Analytics view closed, discarding response");
        }
        Ok(value)
    }
}
