//! Project catalog and project pages.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::{
    Caller, GithubRepoLink, GithubUserLink, PageRequest, ProjectCardSort, ProjectCardView,
    ProjectCatalog, ProjectDetailsView, ProjectId, ProjectLeaderView, ProjectListFilters,
    ProjectVisibility, SponsorView, TopContributorView, UserId,
};
use crate::storage::models::{Dataset, ProjectRecord};

use super::budgets::remaining_usd_budget;
use super::{Index, cmp_upper};

const TOP_CONTRIBUTORS: usize = 3;

/// How the caller relates to a project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Relation {
    lead: bool,
    invited: bool,
    contributor: bool,
}

fn relation(index: &Index<'_>, project_id: ProjectId, caller: &Caller) -> Relation {
    let Some(user) = caller.authenticated() else {
        return Relation::default();
    };
    let data = index.data();
    let gid = user.github_user_id;
    Relation {
        lead: data
            .project_leads
            .iter()
            .any(|l| l.project_id == project_id && l.user_id == user.user_id),
        invited: data
            .lead_invitations
            .iter()
            .any(|i| i.project_id == project_id && i.github_user_id == gid),
        contributor: data
            .project_contributors
            .iter()
            .chain(&data.pending_contributors)
            .any(|c| c.project_id == project_id && c.github_user_id == gid),
    }
}

fn repo_count(index: &Index<'_>, project_id: ProjectId) -> i64 {
    i64::try_from(index.project_repo_ids(project_id).len()).unwrap_or(i64::MAX)
}

fn contributor_count(index: &Index<'_>, project_id: ProjectId) -> i64 {
    let count = index
        .data()
        .project_contributors
        .iter()
        .filter(|c| c.project_id == project_id)
        .count();
    i64::try_from(count).unwrap_or(i64::MAX)
}

/// Projects without repositories are never listed. Public projects are
/// listed for everyone, private ones only for their leads, invited leads
/// and contributors.
fn is_visible(index: &Index<'_>, project: &ProjectRecord, relation: Relation) -> bool {
    repo_count(index, project.id) > 0
        && (project.visibility == ProjectVisibility::Public
            || relation.lead
            || relation.invited
            || relation.contributor)
}

fn leaders(index: &Index<'_>, project_id: ProjectId) -> Vec<ProjectLeaderView> {
    let mut leaders: Vec<ProjectLeaderView> = index
        .lead_ids(project_id)
        .into_iter()
        .filter_map(|id| index.user(id))
        .map(|user| {
            let link = index.account_link(user.github_user_id);
            ProjectLeaderView {
                id: user.id,
                github_user_id: user.github_user_id,
                login: link.login,
                avatar_url: link.avatar_url,
            }
        })
        .collect();
    leaders.sort_by(|a, b| cmp_upper(&a.login, &b.login).then_with(|| a.id.cmp(&b.id)));
    leaders
}

fn technologies(index: &Index<'_>, project_id: ProjectId) -> BTreeMap<String, i64> {
    let mut technologies = BTreeMap::new();
    for repo in index
        .project_repo_ids(project_id)
        .into_iter()
        .filter_map(|id| index.repo(id))
    {
        for (language, size) in &repo.languages {
            *technologies.entry(language.clone()).or_insert(0) += size;
        }
    }
    technologies
}

fn sponsors(index: &Index<'_>, project_id: ProjectId) -> Vec<SponsorView> {
    let data = index.data();
    let mut sponsors: Vec<SponsorView> = data
        .project_sponsors
        .iter()
        .filter(|s| s.project_id == project_id)
        .filter_map(|link| data.sponsors.iter().find(|s| s.id == link.sponsor_id))
        .map(|s| SponsorView {
            id: s.id,
            name: s.name.clone(),
            logo_url: s.logo_url.clone(),
            url: s.url.clone(),
        })
        .collect();
    sponsors.sort_by(|a, b| cmp_upper(&a.name, &b.name));
    sponsors
}

fn card(index: &Index<'_>, project: &ProjectRecord, relation: Relation) -> ProjectCardView {
    let missing_installation = relation.lead
        && index
            .project_repo_ids(project.id)
            .into_iter()
            .filter_map(|id| index.repo(id))
            .any(|r| !r.has_app_installation);
    ProjectCardView {
        id: project.id,
        slug: project.slug.clone(),
        name: project.name.clone(),
        short_description: project.short_description.clone(),
        logo_url: project.logo_url.clone(),
        hiring: project.hiring,
        visibility: project.visibility,
        repo_count: repo_count(index, project.id),
        contributor_count: contributor_count(index, project.id),
        leaders: leaders(index, project.id),
        technologies: technologies(index, project.id),
        sponsors: sponsors(index, project.id),
        is_pending_project_lead: relation.invited,
        is_missing_github_app_installation: missing_installation,
    }
}

fn matches(card: &ProjectCardView, relation: Relation, filters: &ProjectListFilters) -> bool {
    if filters.mine && !(relation.lead || relation.invited) {
        return false;
    }
    if let Some(wanted) = &filters.technologies {
        if !wanted.iter().any(|t| card.technologies.contains_key(t)) {
            return false;
        }
    }
    if let Some(wanted) = &filters.sponsors {
        if !card.sponsors.iter().any(|s| wanted.contains(&s.name)) {
            return false;
        }
    }
    filters.search.as_deref().is_none_or(|search| {
        let needle = search.to_lowercase();
        card.name.to_lowercase().contains(&needle)
            || card.short_description.to_lowercase().contains(&needle)
    })
}

fn compare_cards(
    sort: ProjectCardSort,
    ranks: &BTreeMap<ProjectId, i32>,
    a: &ProjectCardView,
    b: &ProjectCardView,
) -> Ordering {
    let rank = |card: &ProjectCardView| ranks.get(&card.id).copied().unwrap_or_default();
    let by_name = || cmp_upper(&a.name, &b.name);
    let primary = match sort {
        ProjectCardSort::Name => Ordering::Equal,
        ProjectCardSort::ReposCount => b.repo_count.cmp(&a.repo_count),
        ProjectCardSort::ContributorsCount => b.contributor_count.cmp(&a.contributor_count),
        ProjectCardSort::Rank => rank(b).cmp(&rank(a)),
    };
    b.is_pending_project_lead
        .cmp(&a.is_pending_project_lead)
        .then(primary)
        .then_with(by_name)
        .then_with(|| a.id.cmp(&b.id))
}

/// Catalog page visible to `caller`, with the technology and sponsor
/// options available across every project the caller may see.
#[must_use]
pub fn project_catalog(
    data: &Dataset,
    caller: &Caller,
    filters: &ProjectListFilters,
    sort: ProjectCardSort,
    page: PageRequest,
) -> ProjectCatalog {
    let index = Index::new(data);
    let visible: Vec<(ProjectCardView, Relation)> = data
        .projects
        .iter()
        .filter_map(|project| {
            let relation = relation(&index, project.id, caller);
            is_visible(&index, project, relation).then(|| (card(&index, project, relation), relation))
        })
        .collect();

    let technologies: BTreeSet<String> = visible
        .iter()
        .flat_map(|(card, _)| card.technologies.keys().cloned())
        .collect();
    let mut sponsor_options: Vec<SponsorView> = Vec::new();
    for sponsor in visible.iter().flat_map(|(card, _)| &card.sponsors) {
        if !sponsor_options.iter().any(|s| s.id == sponsor.id) {
            sponsor_options.push(sponsor.clone());
        }
    }
    sponsor_options.sort_by(|a, b| cmp_upper(&a.name, &b.name));

    let ranks: BTreeMap<ProjectId, i32> = data.projects.iter().map(|p| (p.id, p.rank)).collect();
    let mut cards: Vec<ProjectCardView> = visible
        .into_iter()
        .filter(|(card, relation)| matches(card, *relation, filters))
        .map(|(card, _)| card)
        .collect();
    cards.sort_by(|a, b| compare_cards(sort, &ranks, a, b));

    ProjectCatalog {
        projects: page.slice(cards),
        technologies: technologies.into_iter().collect(),
        sponsors: sponsor_options,
    }
}

/// Cards for `project_ids`, kept in the given order. Ids missing from the
/// snapshot are skipped.
#[must_use]
pub fn project_cards(
    data: &Dataset,
    caller: &Caller,
    project_ids: &[ProjectId],
) -> Vec<ProjectCardView> {
    let index = Index::new(data);
    project_ids
        .iter()
        .filter_map(|id| index.project(*id))
        .map(|project| card(&index, project, relation(&index, project.id, caller)))
        .collect()
}

fn top_contributors(index: &Index<'_>, project_id: ProjectId) -> Vec<TopContributorView> {
    let repo_ids = index.project_repo_ids(project_id);
    let mut counts: BTreeMap<i64, i64> = BTreeMap::new();
    for contribution in index
        .data()
        .contributions
        .iter()
        .filter(|c| repo_ids.contains(&c.repo_id))
    {
        *counts.entry(contribution.contributor_id).or_insert(0) += 1;
    }
    let mut rows: Vec<(GithubUserLink, i64)> = counts
        .into_iter()
        .map(|(id, count)| (index.account_link(id), count))
        .collect();
    rows.sort_by(|(a, a_count), (b, b_count)| {
        b_count
            .cmp(a_count)
            .then_with(|| cmp_upper(&a.login, &b.login))
    });
    rows.into_iter()
        .take(TOP_CONTRIBUTORS)
        .map(|(github_user, contribution_count)| TopContributorView {
            github_user,
            contribution_count,
        })
        .collect()
}

/// Project page, `None` when the project does not exist.
#[must_use]
pub fn project_details(data: &Dataset, project_id: ProjectId) -> Option<ProjectDetailsView> {
    let index = Index::new(data);
    let project = index.project(project_id)?;
    let mut repos: Vec<GithubRepoLink> = index
        .project_repo_ids(project_id)
        .into_iter()
        .filter_map(|id| index.repo_link(id))
        .collect();
    repos.sort_by(|a, b| cmp_upper(&a.name, &b.name).then_with(|| a.id.cmp(&b.id)));
    let invited_leaders: Vec<GithubUserLink> = data
        .lead_invitations
        .iter()
        .filter(|i| i.project_id == project_id)
        .map(|i| index.account_link(i.github_user_id))
        .collect();

    Some(ProjectDetailsView {
        id: project.id,
        slug: project.slug.clone(),
        name: project.name.clone(),
        short_description: project.short_description.clone(),
        long_description: project.long_description.clone(),
        logo_url: project.logo_url.clone(),
        more_info_url: project.more_info_url.clone(),
        hiring: project.hiring,
        visibility: project.visibility,
        rank: project.rank,
        reward_settings: project.reward_settings.clone(),
        leaders: leaders(&index, project_id),
        invited_leaders,
        sponsors: sponsors(&index, project_id),
        technologies: technologies(&index, project_id),
        repos,
        top_contributors: top_contributors(&index, project_id),
        contributor_count: contributor_count(&index, project_id),
        remaining_usd_budget: remaining_usd_budget(&index, project_id),
    })
}

/// Resolves a slug to a project id.
#[must_use]
pub fn project_id_by_slug(data: &Dataset, slug: &str) -> Option<ProjectId> {
    data.projects.iter().find(|p| p.slug == slug).map(|p| p.id)
}

/// Lead roster of a project.
#[must_use]
pub fn project_lead_ids(data: &Dataset, project_id: ProjectId) -> Vec<UserId> {
    Index::new(data).lead_ids(project_id)
}
