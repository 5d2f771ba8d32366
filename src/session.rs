//! Session-scoped state: the current profile, its plan and narrative.
//!
//! A `Session` is owned by whoever drives one user's interaction and is
//! passed explicitly to each handler. Nothing here is global.

use chrono::NaiveDate;
use rand::Rng;
use tracing::{info, warn};

use crate::error::PlanError;
use crate::metabolic::ActivityTable;
use crate::narrative::NarrativeService;
use crate::plan::{self, Plan, Progress};
use crate::profile::Profile;
use crate::prompt;

#[derive(Debug, Clone, Default)]
pub struct Session {
    profile: Option<Profile>,
    plan: Option<Plan>,
    narrative: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    pub fn plan(&self) -> Option<&Plan> {
        self.plan.as_ref()
    }

    pub fn narrative(&self) -> Option<&str> {
        self.narrative.as_deref()
    }

    /// Generate a fresh plan for `profile` and make it current.
    ///
    /// On failure the previous profile and plan are left untouched. On
    /// success any narrative from the previous plan is discarded.
    pub fn submit<R: Rng + ?Sized>(
        &mut self,
        profile: Profile,
        table: &ActivityTable,
        start_date: NaiveDate,
        rng: &mut R,
    ) -> Result<&Plan, PlanError> {
        let plan = plan::generate_plan(&profile, table, start_date, rng)?;
        self.profile = Some(profile);
        self.narrative = None;
        Ok(self.plan.insert(plan))
    }

    /// Ask `service` for narrative text about the current plan.
    ///
    /// The plan is unaffected whether or not this succeeds.
    pub fn narrate(&mut self, service: &dyn NarrativeService) -> Result<&str, PlanError> {
        let (Some(profile), Some(plan)) = (&self.profile, &self.plan) else {
            return Err(PlanError::NarrativeUnavailable {
                reason: "no plan has been generated yet".to_owned(),
            });
        };
        let request = prompt::build_prompt(profile, plan.energy());
        match service.generate(&request) {
            Ok(text) => {
                info!(text_len = text.len(), "narrative stored");
                Ok(self.narrative.insert(text).as_str())
            }
            Err(e) => {
                warn!(err = %e, "narrative unavailable; plan kept");
                Err(e)
            }
        }
    }

    /// Initial weight against the last projected day of the current plan.
    pub fn progress(&self) -> Option<Progress> {
        let profile = self.profile.as_ref()?;
        let plan = self.plan.as_ref()?;
        Some(plan.progress_at(profile.weight_kg, plan.len() - 1))
    }

    /// Drop the profile, plan and narrative.
    pub fn clear(&mut self) {
        self.profile = None;
        self.plan = None;
        self.narrative = None;
    }
}
