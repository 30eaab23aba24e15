//! OpenAPI document of the REST surface.

use utoipa::OpenApi;

use super::handlers::{contributions, github, me, projects, system};

/// Generated OpenAPI description, served by Swagger UI when the
/// `swagger-ui` feature is on.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "contribution-marketplace",
        description = "Projects, contributions and rewards of the open-source contribution marketplace."
    ),
    paths(
        system::health_handler,
        projects::list_projects,
        projects::create_project,
        projects::get_project,
        projects::get_project_by_slug,
        projects::update_project,
        projects::get_budgets,
        projects::get_contributors,
        projects::get_rewards,
        projects::get_reward,
        projects::get_reward_items,
        projects::get_rewardable_items,
        projects::patch_ignored_contributions,
        contributions::get_contribution,
        me::my_contributions,
        me::my_contributed_projects,
        me::my_contributed_repos,
        me::my_rewards,
        me::my_reward,
        me::my_reward_items,
        me::accept_lead_invitation,
        github::get_issue,
        github::get_pull_request,
    ),
    tags(
        (name = "System", description = "Service health"),
        (name = "Projects", description = "Catalog, project pages and administration"),
        (name = "Rewards", description = "Rewards paid by a project"),
        (name = "Contributions", description = "Contribution details and ignore overrides"),
        (name = "Me", description = "Resources of the authenticated caller"),
        (name = "GitHub", description = "Indexed issue and pull request lookups"),
    )
)]
pub struct ApiDoc;
