use serde::{Deserialize, Serialize};

/// A section of a plan that is produced by one of the generation tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanSection {
    Imagination,
    AboutThePlace,
    BestTimeToVisit,
    ActivitiesToDo,
    LocalCuisine,
    PackingChecklist,
    Itinerary,
    TopPlacesToVisit,
}

impl PlanSection {
    pub const ALL: [PlanSection; 8] = [
        PlanSection::Imagination,
        PlanSection::AboutThePlace,
        PlanSection::BestTimeToVisit,
        PlanSection::ActivitiesToDo,
        PlanSection::LocalCuisine,
        PlanSection::PackingChecklist,
        PlanSection::Itinerary,
        PlanSection::TopPlacesToVisit,
    ];

    /// Field name of the flag inside `content_generation_state`.
    pub fn flag_name(&self) -> &'static str {
        match self {
            PlanSection::Imagination => "imagination",
            PlanSection::AboutThePlace => "about_the_place",
            PlanSection::BestTimeToVisit => "best_time_to_visit",
            PlanSection::ActivitiesToDo => "activities_to_do",
            PlanSection::LocalCuisine => "local_cuisine",
            PlanSection::PackingChecklist => "packing_checklist",
            PlanSection::Itinerary => "itinerary",
            PlanSection::TopPlacesToVisit => "top_places_to_visit",
        }
    }
}

/// Persisted completion flags of a plan. Flags only ever move from false to true.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentGenerationState {
    pub imagination: bool,
    pub about_the_place: bool,
    pub best_time_to_visit: bool,
    pub activities_to_do: bool,
    pub local_cuisine: bool,
    pub packing_checklist: bool,
    pub itinerary: bool,
    pub top_places_to_visit: bool,
}

impl ContentGenerationState {
    pub fn is_complete(&self, section: PlanSection) -> bool {
        match section {
            PlanSection::Imagination => self.imagination,
            PlanSection::AboutThePlace => self.about_the_place,
            PlanSection::BestTimeToVisit => self.best_time_to_visit,
            PlanSection::ActivitiesToDo => self.activities_to_do,
            PlanSection::LocalCuisine => self.local_cuisine,
            PlanSection::PackingChecklist => self.packing_checklist,
            PlanSection::Itinerary => self.itinerary,
            PlanSection::TopPlacesToVisit => self.top_places_to_visit,
        }
    }

    pub fn mark_complete(&mut self, section: PlanSection) {
        let flag = match section {
            PlanSection::Imagination => &mut self.imagination,
            PlanSection::AboutThePlace => &mut self.about_the_place,
            PlanSection::BestTimeToVisit => &mut self.best_time_to_visit,
            PlanSection::ActivitiesToDo => &mut self.activities_to_do,
            PlanSection::LocalCuisine => &mut self.local_cuisine,
            PlanSection::PackingChecklist => &mut self.packing_checklist,
            PlanSection::Itinerary => &mut self.itinerary,
            PlanSection::TopPlacesToVisit => &mut self.top_places_to_visit,
        };
        *flag = true;
    }

    pub fn completed_count(&self) -> usize {
        PlanSection::ALL
            .iter()
            .filter(|section| self.is_complete(**section))
            .count()
    }

    pub fn total_count(&self) -> usize {
        PlanSection::ALL.len()
    }

    pub fn progress(&self) -> f64 {
        self.completed_count() as f64 / self.total_count() as f64
    }

    pub fn is_finished(&self) -> bool {
        self.completed_count() == self.total_count()
    }

    pub fn pending_sections(&self) -> Vec<PlanSection> {
        PlanSection::ALL
            .iter()
            .copied()
            .filter(|section| !self.is_complete(*section))
            .collect()
    }
}

/// The state a client tracks: the persisted flags plus `weather`, which is
/// fetched by the client itself and never stored server-side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientContentState {
    #[serde(flatten)]
    pub persisted: ContentGenerationState,
    pub weather: bool,
}

impl ClientContentState {
    pub fn new(persisted: ContentGenerationState, weather: bool) -> Self {
        Self { persisted, weather }
    }

    pub fn progress(&self) -> f64 {
        let completed = self.persisted.completed_count() + usize::from(self.weather);
        completed as f64 / (self.persisted.total_count() + 1) as f64
    }
}

/// Response body of the content-state read. `client_progress` also counts the
/// weather flag the caller reports for itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentStateView {
    pub plan_id: String,
    pub state: ContentGenerationState,
    pub completed: usize,
    pub total: usize,
    pub progress: f64,
    pub finished: bool,
    pub client_progress: f64,
    pub pending: Vec<PlanSection>,
}

impl ContentStateView {
    pub fn new(plan_id: impl Into<String>, state: ContentGenerationState, weather: bool) -> Self {
        Self {
            plan_id: plan_id.into(),
            state,
            completed: state.completed_count(),
            total: state.total_count(),
            progress: state.progress(),
            finished: state.is_finished(),
            client_progress: ClientContentState::new(state, weather).progress(),
            pending: state.pending_sections(),
        }
    }
}
