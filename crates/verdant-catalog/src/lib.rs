use rust_decimal::Decimal;
use verdant_core::Project;

/// Immutable project reference data. The settlement path treats this as
/// an external collaborator and only ever reads from it.
#[derive(Debug, Clone)]
pub struct Catalog {
    projects: Vec<Project>,
}

impl Catalog {
    pub fn seeded() -> Self {
        Self {
            projects: seed_projects(),
        }
    }

    pub fn all(&self) -> &[Project] {
        &self.projects
    }

    pub fn find(&self, project_id: &str) -> Option<&Project> {
        self.projects.iter().find(|project| project.id == project_id)
    }

    pub fn by_type<'a>(&'a self, project_type: &str) -> Vec<&'a Project> {
        self.projects
            .iter()
            .filter(|project| project.project_type == project_type)
            .collect()
    }
}

fn seed_projects() -> Vec<Project> {
    vec![
        Project {
            id: "prj-sundarbans-mangrove".to_string(),
            name: "Sundarbans Mangrove Restoration".to_string(),
            country: "India".to_string(),
            region: "West Bengal".to_string(),
            project_type: "Reforestation".to_string(),
            description: "Replanting of degraded mangrove belts across the Sundarbans delta."
                .to_string(),
            price_per_ton: Decimal::new(800, 0),
            available_credits: 12_000,
            verified: true,
            impact_per_year: 45_000,
            certification: Some("Verra VCS".to_string()),
        },
        Project {
            id: "prj-thar-solar".to_string(),
            name: "Thar Desert Solar Park".to_string(),
            country: "India".to_string(),
            region: "Rajasthan".to_string(),
            project_type: "Renewable Energy".to_string(),
            description: "Utility-scale solar generation displacing coal-fired baseload."
                .to_string(),
            price_per_ton: Decimal::new(650, 0),
            available_credits: 30_000,
            verified: true,
            impact_per_year: 120_000,
            certification: Some("Gold Standard".to_string()),
        },
        Project {
            id: "prj-deccan-cookstoves".to_string(),
            name: "Deccan Clean Cookstove Programme".to_string(),
            country: "India".to_string(),
            region: "Maharashtra".to_string(),
            project_type: "Energy Efficiency".to_string(),
            description: "Distribution of efficient cookstoves cutting household biomass use."
                .to_string(),
            price_per_ton: Decimal::new(720, 0),
            available_credits: 8_500,
            verified: true,
            impact_per_year: 18_000,
            certification: None,
        },
        Project {
            id: "prj-lakshadweep-seagrass".to_string(),
            name: "Lakshadweep Seagrass Meadows".to_string(),
            country: "India".to_string(),
            region: "Lakshadweep".to_string(),
            project_type: "Ocean Conservation".to_string(),
            description: "Protection and regrowth of blue-carbon seagrass meadows.".to_string(),
            price_per_ton: Decimal::new(950, 0),
            available_credits: 4_200,
            verified: false,
            impact_per_year: 9_500,
            certification: None,
        },
        Project {
            id: "prj-nilgiri-shola".to_string(),
            name: "Nilgiri Shola Forest Revival".to_string(),
            country: "India".to_string(),
            region: "Tamil Nadu".to_string(),
            project_type: "Reforestation".to_string(),
            description: "Native shola forest restoration on former plantation land.".to_string(),
            price_per_ton: Decimal::new(880, 0),
            available_credits: 6_800,
            verified: true,
            impact_per_year: 22_000,
            certification: Some("Verra VCS".to_string()),
        },
    ]
}
