//! PostgreSQL storage adapter.
//!
//! Each read opens a `REPEATABLE READ, READ ONLY` transaction, loads the
//! rows the request needs into a [`Dataset`] and hands it to the
//! [`crate::query`] engine. A read names its starting point with a
//! [`Scope`] and the row groups its view uses with [`Rows`], so every
//! table is filtered by project, repository or account before it is read.
//! Budgets, quotes and rewards therefore always come from the same
//! snapshot. The catalog decides visibility, filters, order and paging in
//! SQL and only loads the rows of the requested page. Writes run in their
//! own transaction.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::models::{
    BudgetRecord, ClosingIssueRecord, CodeReviewRecord, ContributionRecord, ContributionTarget,
    Dataset, GithubAccountRecord, GithubRepoRecord, IgnoredContributionRecord, IssueRecord,
    LeadInvitationRecord, PaymentRecord, ProjectContributorRecord, ProjectLeadRecord,
    ProjectRecord, ProjectRepoRecord, ProjectSponsorRecord, PullRequestRecord, RewardItemRecord,
    RewardRecord, SponsorRecord, UserRecord,
};
use super::{ContributionStorage, ProjectStorage, StorageResult, UserStorage, project_slug};
use crate::domain::{
    AuthenticatedUser, BudgetsView, Caller, ContributionDetailsView, ContributionFilters,
    ContributionSort, ContributionView, ContributorSort, ContributorView, CreateProjectCommand,
    CryptoUsdQuote, GithubRepoId, GithubRepoLink, GithubUserId, LeadContributorView, Page,
    PageRequest, PayoutInfo, ProjectCardSort, ProjectCatalog, ProjectDetailsView, ProjectId,
    ProjectLink, ProjectListFilters, ProjectVisibility, RewardDetailsView, RewardId,
    RewardItemView, RewardSettings, RewardSort, RewardView, RewardableItemFilters,
    RewardableItemView, SortDirection, SponsorView, UpdateProjectCommand, UserId, UserRewardsPage,
};
use crate::error::MarketplaceError;
use crate::query::{self, cmp_upper};

/// Where a read starts.
#[derive(Debug, Clone)]
enum Scope {
    /// One project and its linked repositories.
    Project(ProjectId),
    /// Linked repositories a contributor worked in, with their projects.
    Contributor(GithubUserId),
    /// Rewards received by an account, with their projects.
    Recipient(GithubUserId),
    /// One reward and its project.
    Reward(RewardId),
    /// One repository, by owner and name.
    Repo { owner: String, name: String },
}

/// Row groups loaded on top of the scoped project rows.
///
/// Reference rows for people are always limited to the accounts the
/// loaded rows mention. Payout info is personal and only read for the
/// recipients of the rewards in scope, when a view shows reward statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Rows {
    /// Leads, invitations, contributors and sponsors.
    members: bool,
    /// Repositories with their issues, pull requests, reviews,
    /// contributions and ignore overrides.
    github: bool,
    /// Rewards with their items and payments.
    rewards: bool,
    /// Payout info of reward recipients.
    payout_info: bool,
    /// Budgets.
    budgets: bool,
}

impl Rows {
    const NONE: Self = Self {
        members: false,
        github: false,
        rewards: false,
        payout_info: false,
        budgets: false,
    };
    /// Indexed work only.
    const GITHUB: Self = Self {
        github: true,
        ..Self::NONE
    };
    /// Budgets and quotes only.
    const BUDGETS: Self = Self {
        budgets: true,
        ..Self::NONE
    };
    /// Everything a project page shows.
    const PROJECT_PAGE: Self = Self {
        members: true,
        github: true,
        budgets: true,
        ..Self::NONE
    };
    /// Work and the rewards paying for it, without statuses.
    const EARNINGS: Self = Self {
        github: true,
        rewards: true,
        ..Self::NONE
    };
    /// Rewards with their statuses.
    const REWARD_STATUSES: Self = Self {
        rewards: true,
        payout_info: true,
        ..Self::NONE
    };
    /// Work and rewards with their statuses.
    const WORK_AND_STATUSES: Self = Self {
        github: true,
        rewards: true,
        payout_info: true,
        ..Self::NONE
    };

    const fn needs_quotes(self) -> bool {
        self.rewards || self.budgets
    }
}

/// PostgreSQL-backed storage using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    /// Creates the adapter over a connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Persistence`] when a migration fails.
    pub async fn migrate(&self) -> StorageResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| MarketplaceError::Persistence(e.to_string()))
    }

    async fn read_transaction(&self) -> StorageResult<Transaction<'static, Postgres>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;
        Ok(tx)
    }

    /// Loads the snapshot a read needs.
    async fn load(&self, scope: Scope, rows: Rows) -> StorageResult<Dataset> {
        let mut tx = self.read_transaction().await?;
        let data = load_dataset(&mut tx, &scope, rows).await?;
        tx.commit().await?;
        Ok(data)
    }
}

fn decode<T: DeserializeOwned>(column: &str, raw: String) -> StorageResult<T> {
    serde_json::from_value(serde_json::Value::String(raw.clone()))
        .map_err(|_| MarketplaceError::Persistence(format!("invalid {column} value '{raw}'")))
}

fn encode<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

fn uuids<T: Copy + Into<Uuid>>(ids: impl IntoIterator<Item = T>) -> Vec<Uuid> {
    ids.into_iter().map(Into::into).collect()
}

type ProjectRow = (
    Uuid,
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    bool,
    String,
    i32,
    bool,
    bool,
    bool,
    Option<DateTime<Utc>>,
);

type IssueRow = (
    i64,
    i64,
    i64,
    String,
    String,
    Option<String>,
    String,
    i64,
    i64,
    DateTime<Utc>,
    Option<DateTime<Utc>>,
);

type PullRequestRow = (
    i64,
    i64,
    i64,
    String,
    String,
    Option<String>,
    String,
    i64,
    i64,
    DateTime<Utc>,
    Option<DateTime<Utc>>,
    Vec<i64>,
);

type ContributionRow = (
    String,
    i64,
    i64,
    String,
    DateTime<Utc>,
    Option<DateTime<Utc>>,
    Option<i64>,
    Option<i64>,
    Option<String>,
);

type RewardRow = (
    Uuid,
    Uuid,
    Uuid,
    i64,
    Decimal,
    String,
    DateTime<Utc>,
    Option<DateTime<Utc>>,
);

const CONTRIBUTION_COLUMNS: &str = "SELECT id, contributor_id, repo_id, status, created_at, \
                                    completed_at, issue_id, pull_request_id, code_review_id \
                                    FROM contributions";

fn contribution_record(row: ContributionRow) -> StorageResult<ContributionRecord> {
    let (id, contributor_id, repo_id, status, created_at, completed_at, issue, pr, review) = row;
    let target = match (pr, issue, review) {
        (Some(pr), _, _) => ContributionTarget::PullRequest(pr),
        (None, Some(issue), _) => ContributionTarget::Issue(issue),
        (None, None, Some(review)) => ContributionTarget::CodeReview(review),
        (None, None, None) => {
            return Err(MarketplaceError::Persistence(format!(
                "contribution {id} has no target"
            )));
        }
    };
    Ok(ContributionRecord {
        id,
        contributor_id,
        repo_id,
        status: decode("status", status)?,
        created_at,
        completed_at,
        target,
    })
}

/// Project rows and their repository links.
async fn load_project_rows(
    conn: &mut PgConnection,
    data: &mut Dataset,
    project_ids: &[Uuid],
) -> StorageResult<()> {
    let projects = sqlx::query_as::<_, ProjectRow>(
        "SELECT id, slug, name, short_description, long_description, logo_url, more_info_url, \
         hiring, visibility, rank, ignore_pull_requests, ignore_issues, ignore_code_reviews, \
         ignore_contributions_before FROM projects WHERE id = ANY($1)",
    )
    .bind(project_ids)
    .fetch_all(&mut *conn)
    .await?;
    for (
        id,
        slug,
        name,
        short_description,
        long_description,
        logo_url,
        more_info_url,
        hiring,
        visibility,
        rank,
        ignore_pull_requests,
        ignore_issues,
        ignore_code_reviews,
        ignore_contributions_before,
    ) in projects
    {
        data.projects.push(ProjectRecord {
            id: id.into(),
            slug,
            name,
            short_description,
            long_description,
            logo_url,
            more_info_url,
            hiring,
            visibility: decode::<ProjectVisibility>("visibility", visibility)?,
            rank,
            reward_settings: RewardSettings {
                ignore_pull_requests,
                ignore_issues,
                ignore_code_reviews,
                ignore_contributions_before,
            },
        });
    }

    data.project_repos = sqlx::query_as::<_, (Uuid, i64)>(
        "SELECT project_id, repo_id FROM project_github_repos WHERE project_id = ANY($1)",
    )
    .bind(project_ids)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .map(|(project_id, repo_id)| ProjectRepoRecord {
        project_id: project_id.into(),
        repo_id,
    })
    .collect();
    Ok(())
}

/// Leads, invitations, contributors and sponsors of the given projects.
async fn load_memberships(
    conn: &mut PgConnection,
    data: &mut Dataset,
    project_ids: &[Uuid],
) -> StorageResult<()> {
    data.project_leads = sqlx::query_as::<_, (Uuid, Uuid)>(
        "SELECT project_id, user_id FROM project_leads WHERE project_id = ANY($1)",
    )
    .bind(project_ids)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .map(|(project_id, user_id)| ProjectLeadRecord {
        project_id: project_id.into(),
        user_id: user_id.into(),
    })
    .collect();

    data.lead_invitations = sqlx::query_as::<_, (Uuid, i64)>(
        "SELECT project_id, github_user_id FROM pending_project_leader_invitations \
         WHERE project_id = ANY($1)",
    )
    .bind(project_ids)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .map(|(project_id, github_user_id)| LeadInvitationRecord {
        project_id: project_id.into(),
        github_user_id,
    })
    .collect();

    data.project_contributors = sqlx::query_as::<_, (Uuid, i64)>(
        "SELECT DISTINCT pgr.project_id, c.contributor_id FROM contributions c \
         JOIN project_github_repos pgr ON pgr.repo_id = c.repo_id \
         WHERE pgr.project_id = ANY($1)",
    )
    .bind(project_ids)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .map(|(project_id, github_user_id)| ProjectContributorRecord {
        project_id: project_id.into(),
        github_user_id,
    })
    .collect();

    data.pending_contributors = sqlx::query_as::<_, (Uuid, i64)>(
        "SELECT project_id, github_user_id FROM project_pending_contributors \
         WHERE project_id = ANY($1)",
    )
    .bind(project_ids)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .map(|(project_id, github_user_id)| ProjectContributorRecord {
        project_id: project_id.into(),
        github_user_id,
    })
    .collect();

    data.project_sponsors = sqlx::query_as::<_, (Uuid, Uuid)>(
        "SELECT project_id, sponsor_id FROM project_sponsors WHERE project_id = ANY($1)",
    )
    .bind(project_ids)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .map(|(project_id, sponsor_id)| ProjectSponsorRecord {
        project_id: project_id.into(),
        sponsor_id: sponsor_id.into(),
    })
    .collect();

    let sponsor_ids: BTreeSet<Uuid> = uuids(data.project_sponsors.iter().map(|s| s.sponsor_id))
        .into_iter()
        .collect();
    let sponsor_ids: Vec<Uuid> = sponsor_ids.into_iter().collect();
    data.sponsors = sqlx::query_as::<_, (Uuid, String, Option<String>, Option<String>)>(
        "SELECT id, name, logo_url, url FROM sponsors WHERE id = ANY($1)",
    )
    .bind(&sponsor_ids)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .map(|(id, name, logo_url, url)| SponsorRecord {
        id: id.into(),
        name,
        logo_url,
        url,
    })
    .collect();
    Ok(())
}

/// Repositories in `repo_ids` or linked to a loaded project.
async fn load_repos(
    conn: &mut PgConnection,
    data: &mut Dataset,
    repo_ids: &[GithubRepoId],
) -> StorageResult<()> {
    let ids: BTreeSet<GithubRepoId> = repo_ids
        .iter()
        .copied()
        .chain(data.project_repos.iter().map(|r| r.repo_id))
        .collect();
    let ids: Vec<GithubRepoId> = ids.into_iter().collect();
    for (id, owner, name, html_url, languages, has_app_installation) in
        sqlx::query_as::<_, (i64, String, String, String, serde_json::Value, bool)>(
            "SELECT id, owner, name, html_url, languages, has_app_installation FROM github_repos \
             WHERE id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&mut *conn)
        .await?
    {
        data.repos.push(GithubRepoRecord {
            id,
            owner,
            name,
            html_url,
            languages: serde_json::from_value(languages).unwrap_or_default(),
            has_app_installation,
        });
    }
    Ok(())
}

/// Platform users and GitHub accounts the loaded rows refer to.
fn referenced_people(data: &Dataset) -> (Vec<Uuid>, Vec<GithubUserId>) {
    let user_ids: BTreeSet<UserId> = data
        .project_leads
        .iter()
        .map(|l| l.user_id)
        .chain(data.rewards.iter().map(|r| r.requestor_id))
        .collect();
    let github_ids: BTreeSet<GithubUserId> = data
        .lead_invitations
        .iter()
        .map(|i| i.github_user_id)
        .chain(
            data.project_contributors
                .iter()
                .chain(&data.pending_contributors)
                .map(|c| c.github_user_id),
        )
        .chain(data.contributions.iter().map(|c| c.contributor_id))
        .chain(data.issues.iter().map(|i| i.author_id))
        .chain(data.pull_requests.iter().map(|p| p.author_id))
        .chain(data.code_reviews.iter().map(|r| r.author_id))
        .chain(data.rewards.iter().map(|r| r.recipient_id))
        .collect();
    (uuids(user_ids), github_ids.into_iter().collect())
}

/// Users and accounts mentioned by the loaded rows. With `payout_info`,
/// reward recipients also get their payout settings.
async fn load_people(
    conn: &mut PgConnection,
    data: &mut Dataset,
    payout_info: bool,
) -> StorageResult<()> {
    let (user_ids, github_ids) = referenced_people(data);
    data.users = sqlx::query_as::<_, (Uuid, i64)>(
        "SELECT id, github_user_id FROM users WHERE id = ANY($1) OR github_user_id = ANY($2)",
    )
    .bind(&user_ids)
    .bind(&github_ids)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .map(|(id, github_user_id)| UserRecord {
        id: id.into(),
        github_user_id,
        payout_info: None,
    })
    .collect();

    let account_ids: BTreeSet<GithubUserId> = github_ids
        .iter()
        .copied()
        .chain(data.users.iter().map(|u| u.github_user_id))
        .collect();
    let account_ids: Vec<GithubUserId> = account_ids.into_iter().collect();
    data.accounts = sqlx::query_as::<_, (i64, String, Option<String>)>(
        "SELECT id, login, avatar_url FROM github_accounts WHERE id = ANY($1)",
    )
    .bind(&account_ids)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .map(|(id, login, avatar_url)| GithubAccountRecord {
        id,
        login,
        avatar_url,
    })
    .collect();

    if !payout_info {
        return Ok(());
    }
    let recipients: BTreeSet<GithubUserId> = data.rewards.iter().map(|r| r.recipient_id).collect();
    let recipients: Vec<GithubUserId> = recipients.into_iter().collect();
    for (user_id, info) in sqlx::query_as::<_, (Uuid, serde_json::Value)>(
        "SELECT p.user_id, p.payout_info FROM user_payout_infos p \
         JOIN users u ON u.id = p.user_id WHERE u.github_user_id = ANY($1)",
    )
    .bind(&recipients)
    .fetch_all(&mut *conn)
    .await?
    {
        let info = serde_json::from_value::<PayoutInfo>(info)
            .map_err(|e| MarketplaceError::Persistence(format!("invalid payout info: {e}")))?;
        let user_id = UserId::from(user_id);
        if let Some(user) = data.users.iter_mut().find(|u| u.id == user_id) {
            user.payout_info = Some(info);
        }
    }
    Ok(())
}

async fn load_quotes(conn: &mut PgConnection, data: &mut Dataset) -> StorageResult<()> {
    for (currency, price, updated_at) in sqlx::query_as::<_, (String, Decimal, DateTime<Utc>)>(
        "SELECT currency, price, updated_at FROM crypto_usd_quotes",
    )
    .fetch_all(&mut *conn)
    .await?
    {
        data.quotes.push(CryptoUsdQuote {
            currency: decode("currency", currency)?,
            price,
            updated_at,
        });
    }
    Ok(())
}

async fn load_budgets(
    conn: &mut PgConnection,
    data: &mut Dataset,
    project_ids: &[Uuid],
) -> StorageResult<()> {
    for (project_id, currency, initial_amount, remaining_amount) in
        sqlx::query_as::<_, (Uuid, String, Decimal, Decimal)>(
            "SELECT project_id, currency, initial_amount, remaining_amount FROM budgets \
             WHERE project_id = ANY($1)",
        )
        .bind(project_ids)
        .fetch_all(&mut *conn)
        .await?
    {
        data.budgets.push(BudgetRecord {
            project_id: project_id.into(),
            currency: decode("currency", currency)?,
            initial_amount,
            remaining_amount,
        });
    }
    Ok(())
}

async fn load_rewards(
    conn: &mut PgConnection,
    data: &mut Dataset,
    scope: &Scope,
    project_ids: &[Uuid],
) -> StorageResult<()> {
    const COLUMNS: &str = "SELECT id, project_id, requestor_id, recipient_id, amount, currency, \
                           requested_at, invoice_received_at FROM rewards";
    let rows = match scope {
        Scope::Recipient(recipient_id) => {
            sqlx::query_as::<_, RewardRow>(&format!("{COLUMNS} WHERE recipient_id = $1"))
                .bind(recipient_id)
                .fetch_all(&mut *conn)
                .await?
        }
        Scope::Contributor(recipient_id) => {
            sqlx::query_as::<_, RewardRow>(&format!(
                "{COLUMNS} WHERE recipient_id = $1 AND project_id = ANY($2)"
            ))
            .bind(recipient_id)
            .bind(project_ids)
            .fetch_all(&mut *conn)
            .await?
        }
        Scope::Reward(reward_id) => {
            sqlx::query_as::<_, RewardRow>(&format!("{COLUMNS} WHERE id = $1"))
                .bind(reward_id.as_uuid())
                .fetch_all(&mut *conn)
                .await?
        }
        Scope::Project(_) | Scope::Repo { .. } => {
            sqlx::query_as::<_, RewardRow>(&format!("{COLUMNS} WHERE project_id = ANY($1)"))
                .bind(project_ids)
                .fetch_all(&mut *conn)
                .await?
        }
    };
    for (id, project_id, requestor_id, recipient_id, amount, currency, requested_at, invoice) in rows
    {
        data.rewards.push(RewardRecord {
            id: id.into(),
            project_id: project_id.into(),
            requestor_id: requestor_id.into(),
            recipient_id,
            amount,
            currency: decode("currency", currency)?,
            requested_at,
            invoice_received_at: invoice,
        });
    }

    let reward_ids = uuids(data.rewards.iter().map(|r| r.id));
    for (reward_id, kind, item_id) in sqlx::query_as::<_, (Uuid, String, String)>(
        "SELECT reward_id, type, item_id FROM reward_items WHERE reward_id = ANY($1)",
    )
    .bind(&reward_ids)
    .fetch_all(&mut *conn)
    .await?
    {
        data.reward_items.push(RewardItemRecord {
            reward_id: reward_id.into(),
            kind: decode("type", kind)?,
            item_id,
        });
    }

    for (reward_id, amount, currency, transaction_reference, processed_at) in
        sqlx::query_as::<_, (Uuid, Decimal, String, String, DateTime<Utc>)>(
            "SELECT reward_id, amount, currency, transaction_reference, processed_at \
             FROM payments WHERE reward_id = ANY($1)",
        )
        .bind(&reward_ids)
        .fetch_all(&mut *conn)
        .await?
    {
        data.payments.push(PaymentRecord {
            reward_id: reward_id.into(),
            amount,
            currency: decode("currency", currency)?,
            transaction_reference,
            processed_at,
        });
    }
    Ok(())
}

/// Projects a read covers, loading the rewards first when the scope is
/// defined by them.
async fn scope_project_ids(
    conn: &mut PgConnection,
    data: &mut Dataset,
    scope: &Scope,
) -> StorageResult<Vec<Uuid>> {
    let ids = match scope {
        Scope::Project(project_id) => vec![*project_id.as_uuid()],
        Scope::Contributor(contributor_id) => {
            sqlx::query_scalar::<_, Uuid>(
                "SELECT DISTINCT pgr.project_id FROM contributions c \
                 JOIN project_github_repos pgr ON pgr.repo_id = c.repo_id \
                 WHERE c.contributor_id = $1",
            )
            .bind(contributor_id)
            .fetch_all(&mut *conn)
            .await?
        }
        Scope::Recipient(_) | Scope::Reward(_) => {
            load_rewards(conn, data, scope, &[]).await?;
            let ids: BTreeSet<Uuid> = uuids(data.rewards.iter().map(|r| r.project_id))
                .into_iter()
                .collect();
            ids.into_iter().collect()
        }
        Scope::Repo { .. } => Vec::new(),
    };
    Ok(ids)
}

/// Repositories whose indexed work a read covers.
async fn scope_repo_ids(
    conn: &mut PgConnection,
    data: &Dataset,
    scope: &Scope,
) -> StorageResult<Vec<GithubRepoId>> {
    let ids = match scope {
        Scope::Contributor(contributor_id) => {
            sqlx::query_scalar::<_, i64>(
                "SELECT DISTINCT c.repo_id FROM contributions c \
                 JOIN project_github_repos pgr ON pgr.repo_id = c.repo_id \
                 WHERE c.contributor_id = $1",
            )
            .bind(contributor_id)
            .fetch_all(&mut *conn)
            .await?
        }
        Scope::Repo { owner, name } => {
            sqlx::query_scalar::<_, i64>(
                "SELECT id FROM github_repos WHERE upper(owner) = upper($1) AND upper(name) = upper($2)",
            )
            .bind(owner)
            .bind(name)
            .fetch_all(&mut *conn)
            .await?
        }
        Scope::Project(_) | Scope::Recipient(_) | Scope::Reward(_) => {
            let ids: BTreeSet<GithubRepoId> = data.project_repos.iter().map(|r| r.repo_id).collect();
            ids.into_iter().collect()
        }
    };
    Ok(ids)
}

async fn load_github_facts(
    conn: &mut PgConnection,
    data: &mut Dataset,
    repo_ids: &[GithubRepoId],
) -> StorageResult<()> {
    for (id, repo_id, number, title, html_url, body, status, author_id, comments_count, created_at, closed_at) in
        sqlx::query_as::<_, IssueRow>(
            "SELECT id, repo_id, number, title, html_url, body, status, author_id, comments_count, \
             created_at, closed_at FROM github_issues WHERE repo_id = ANY($1)",
        )
        .bind(repo_ids)
        .fetch_all(&mut *conn)
        .await?
    {
        data.issues.push(IssueRecord {
            id,
            repo_id,
            number,
            title,
            html_url,
            body,
            status: decode("status", status)?,
            author_id,
            comments_count,
            created_at,
            closed_at,
        });
    }

    for (
        id,
        repo_id,
        number,
        title,
        html_url,
        body,
        status,
        author_id,
        comments_count,
        created_at,
        closed_at,
        commit_author_ids,
    ) in sqlx::query_as::<_, PullRequestRow>(
        "SELECT id, repo_id, number, title, html_url, body, status, author_id, comments_count, \
         created_at, closed_at, commit_author_ids FROM github_pull_requests WHERE repo_id = ANY($1)",
    )
    .bind(repo_ids)
    .fetch_all(&mut *conn)
    .await?
    {
        data.pull_requests.push(PullRequestRecord {
            id,
            repo_id,
            number,
            title,
            html_url,
            body,
            status: decode("status", status)?,
            author_id,
            comments_count,
            created_at,
            closed_at,
            commit_author_ids,
        });
    }

    let pull_request_ids: Vec<i64> = data.pull_requests.iter().map(|p| p.id).collect();
    for (id, pull_request_id, author_id, status, outcome, requested_at, submitted_at) in
        sqlx::query_as::<_, (String, i64, i64, String, Option<String>, DateTime<Utc>, Option<DateTime<Utc>>)>(
            "SELECT id, pull_request_id, author_id, status, outcome, requested_at, submitted_at \
             FROM github_code_reviews WHERE pull_request_id = ANY($1)",
        )
        .bind(&pull_request_ids)
        .fetch_all(&mut *conn)
        .await?
    {
        data.code_reviews.push(CodeReviewRecord {
            id,
            pull_request_id,
            author_id,
            status: decode("status", status)?,
            outcome: outcome.map(|o| decode("outcome", o)).transpose()?,
            requested_at,
            submitted_at,
        });
    }

    data.closing_issues = sqlx::query_as::<_, (i64, i64)>(
        "SELECT pull_request_id, issue_id FROM github_closing_issues WHERE pull_request_id = ANY($1)",
    )
    .bind(&pull_request_ids)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .map(|(pull_request_id, issue_id)| ClosingIssueRecord {
        pull_request_id,
        issue_id,
    })
    .collect();

    for row in sqlx::query_as::<_, ContributionRow>(&format!(
        "{CONTRIBUTION_COLUMNS} WHERE repo_id = ANY($1)"
    ))
    .bind(repo_ids)
    .fetch_all(&mut *conn)
    .await?
    {
        data.contributions.push(contribution_record(row)?);
    }
    Ok(())
}

async fn load_ignored_contributions(
    conn: &mut PgConnection,
    data: &mut Dataset,
    project_ids: &[Uuid],
) -> StorageResult<()> {
    data.ignored_contributions = sqlx::query_as::<_, (Uuid, String, bool)>(
        "SELECT project_id, contribution_id, ignored FROM ignored_contributions \
         WHERE project_id = ANY($1)",
    )
    .bind(project_ids)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .map(|(project_id, contribution_id, ignored)| IgnoredContributionRecord {
        project_id: project_id.into(),
        contribution_id,
        ignored,
    })
    .collect();
    Ok(())
}

async fn load_dataset(conn: &mut PgConnection, scope: &Scope, rows: Rows) -> StorageResult<Dataset> {
    let mut data = Dataset::default();
    let project_ids = scope_project_ids(conn, &mut data, scope).await?;
    load_project_rows(conn, &mut data, &project_ids).await?;
    if rows.members {
        load_memberships(conn, &mut data, &project_ids).await?;
    }
    if rows.github {
        let repo_ids = scope_repo_ids(conn, &data, scope).await?;
        load_repos(conn, &mut data, &repo_ids).await?;
        load_github_facts(conn, &mut data, &repo_ids).await?;
        load_ignored_contributions(conn, &mut data, &project_ids).await?;
    }
    if rows.rewards && matches!(scope, Scope::Project(_) | Scope::Contributor(_)) {
        load_rewards(conn, &mut data, scope, &project_ids).await?;
    }
    if rows.budgets {
        load_budgets(conn, &mut data, &project_ids).await?;
    }
    if rows.needs_quotes() {
        load_quotes(conn, &mut data).await?;
    }
    load_people(conn, &mut data, rows.payout_info).await?;
    Ok(data)
}

/// A contributor's own contribution rows with the projects and
/// repositories they link to.
async fn load_contributed(
    conn: &mut PgConnection,
    contributor_id: GithubUserId,
) -> StorageResult<Dataset> {
    let mut data = Dataset::default();
    for row in sqlx::query_as::<_, ContributionRow>(&format!(
        "{CONTRIBUTION_COLUMNS} WHERE contributor_id = $1"
    ))
    .bind(contributor_id)
    .fetch_all(&mut *conn)
    .await?
    {
        data.contributions.push(contribution_record(row)?);
    }
    let project_ids = scope_project_ids(conn, &mut data, &Scope::Contributor(contributor_id)).await?;
    load_project_rows(conn, &mut data, &project_ids).await?;
    load_repos(conn, &mut data, &[]).await?;
    Ok(data)
}

/// Catalog visibility and filters. `visible` holds every project the
/// caller may list, `matching` the ones passing the filters.
///
/// Parameters: `$1` caller user id, `$2` caller GitHub id, `$3` public
/// visibility, `$4` technologies, `$5` sponsor names, `$6` search, `$7`
/// mine.
const CATALOG: &str = "\
WITH related AS (\
    SELECT p.id, p.name, p.short_description, p.visibility, p.rank, \
        (SELECT count(*) FROM project_github_repos r WHERE r.project_id = p.id) AS repo_count, \
        (SELECT count(DISTINCT c.contributor_id) FROM contributions c \
            JOIN project_github_repos r ON r.repo_id = c.repo_id \
            WHERE r.project_id = p.id) AS contributor_count, \
        EXISTS (SELECT 1 FROM project_leads l \
            WHERE l.project_id = p.id AND l.user_id = $1) AS is_lead, \
        EXISTS (SELECT 1 FROM pending_project_leader_invitations i \
            WHERE i.project_id = p.id AND i.github_user_id = $2) AS is_invited, \
        (EXISTS (SELECT 1 FROM project_pending_contributors pc \
            WHERE pc.project_id = p.id AND pc.github_user_id = $2) \
         OR EXISTS (SELECT 1 FROM contributions c \
            JOIN project_github_repos r ON r.repo_id = c.repo_id \
            WHERE r.project_id = p.id AND c.contributor_id = $2)) AS is_contributor \
    FROM projects p), \
visible AS (\
    SELECT * FROM related \
    WHERE repo_count > 0 AND (visibility = $3 OR is_lead OR is_invited OR is_contributor)), \
matching AS (\
    SELECT * FROM visible v \
    WHERE (NOT $7 OR v.is_lead OR v.is_invited) \
      AND ($4::text[] IS NULL OR EXISTS (SELECT 1 FROM project_github_repos r \
            JOIN github_repos g ON g.id = r.repo_id \
            WHERE r.project_id = v.id AND g.languages ?| $4)) \
      AND ($5::text[] IS NULL OR EXISTS (SELECT 1 FROM project_sponsors ps \
            JOIN sponsors s ON s.id = ps.sponsor_id \
            WHERE ps.project_id = v.id AND s.name = ANY($5))) \
      AND ($6::text IS NULL OR strpos(lower(v.name), lower($6)) > 0 \
            OR strpos(lower(v.short_description), lower($6)) > 0)) ";

/// Bind values shared by every catalog statement.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CatalogParams {
    user_id: Option<Uuid>,
    github_user_id: Option<GithubUserId>,
    public: String,
    technologies: Option<Vec<String>>,
    sponsors: Option<Vec<String>>,
    search: Option<String>,
    mine: bool,
}

impl CatalogParams {
    fn new(caller: &Caller, filters: &ProjectListFilters) -> Self {
        let filters = filters.clone().normalized();
        let user = caller.authenticated();
        Self {
            user_id: user.map(|u| *u.user_id.as_uuid()),
            github_user_id: user.map(|u| u.github_user_id),
            public: encode(&ProjectVisibility::Public),
            technologies: filters.technologies,
            sponsors: filters.sponsors,
            search: filters.search,
            mine: filters.mine,
        }
    }

    fn bind<'q, O>(
        &'q self,
        query: QueryAs<'q, Postgres, O, PgArguments>,
    ) -> QueryAs<'q, Postgres, O, PgArguments> {
        query
            .bind(self.user_id)
            .bind(self.github_user_id)
            .bind(&self.public)
            .bind(&self.technologies)
            .bind(&self.sponsors)
            .bind(&self.search)
            .bind(self.mine)
    }
}

/// `ORDER BY` clause of the catalog: pending invitations first, then the
/// sort key, then name and id.
const fn catalog_order(sort: ProjectCardSort) -> &'static str {
    match sort {
        ProjectCardSort::Name => "is_invited DESC, upper(name) COLLATE \"C\", id",
        ProjectCardSort::ReposCount => {
            "is_invited DESC, repo_count DESC, upper(name) COLLATE \"C\", id"
        }
        ProjectCardSort::ContributorsCount => {
            "is_invited DESC, contributor_count DESC, upper(name) COLLATE \"C\", id"
        }
        ProjectCardSort::Rank => "is_invited DESC, rank DESC, upper(name) COLLATE \"C\", id",
    }
}

/// `LIMIT` and `OFFSET` of a sanitized page request.
fn page_window(page: PageRequest) -> (i64, i64) {
    let limit = i64::from(page.page_size);
    (limit, limit.saturating_mul(i64::from(page.page_index)))
}

fn conflict_on_slug(err: sqlx::Error, slug: &str) -> MarketplaceError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            MarketplaceError::Conflict(format!("Project slug '{slug}' is already used"))
        }
        _ => err.into(),
    }
}

async fn replace_invitations(
    conn: &mut PgConnection,
    project_id: Uuid,
    github_user_ids: &[GithubUserId],
) -> StorageResult<()> {
    sqlx::query("DELETE FROM pending_project_leader_invitations WHERE project_id = $1")
        .bind(project_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query(
        "INSERT INTO pending_project_leader_invitations (project_id, github_user_id) \
         SELECT $1, unnest($2::bigint[]) ON CONFLICT DO NOTHING",
    )
    .bind(project_id)
    .bind(github_user_ids)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn replace_repos(
    conn: &mut PgConnection,
    project_id: Uuid,
    repo_ids: &[GithubRepoId],
) -> StorageResult<()> {
    sqlx::query("DELETE FROM project_github_repos WHERE project_id = $1")
        .bind(project_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query(
        "INSERT INTO project_github_repos (project_id, repo_id) \
         SELECT $1, unnest($2::bigint[]) ON CONFLICT DO NOTHING",
    )
    .bind(project_id)
    .bind(repo_ids)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn write_reward_settings(
    conn: &mut PgConnection,
    project_id: Uuid,
    settings: &RewardSettings,
) -> StorageResult<()> {
    sqlx::query(
        "UPDATE projects SET ignore_pull_requests = $2, ignore_issues = $3, \
         ignore_code_reviews = $4, ignore_contributions_before = $5 WHERE id = $1",
    )
    .bind(project_id)
    .bind(settings.ignore_pull_requests)
    .bind(settings.ignore_issues)
    .bind(settings.ignore_code_reviews)
    .bind(settings.ignore_contributions_before)
    .execute(&mut *conn)
    .await?;
    Ok(())
}


#[async_trait]
impl ProjectStorage for PostgresStorage {
    #[tracing::instrument(skip(self))]
    async fn project_lead_ids(&self, project_id: ProjectId) -> StorageResult<Vec<UserId>> {
        let ids = sqlx::query_scalar::<_, Uuid>("SELECT user_id FROM project_leads WHERE project_id = $1")
            .bind(project_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;
        Ok(ids.into_iter().map(UserId::from).collect())
    }

    #[tracing::instrument(skip(self))]
    async fn project_id_by_slug(&self, slug: &str) -> StorageResult<Option<ProjectId>> {
        let id = sqlx::query_scalar::<_, Uuid>("SELECT id FROM projects WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id.map(ProjectId::from))
    }

    #[tracing::instrument(skip(self))]
    async fn project_details(
        &self,
        project_id: ProjectId,
    ) -> StorageResult<Option<ProjectDetailsView>> {
        let data = self.load(Scope::Project(project_id), Rows::PROJECT_PAGE).await?;
        Ok(query::projects::project_details(&data, project_id))
    }

    #[tracing::instrument(skip(self))]
    async fn project_catalog(
        &self,
        caller: &Caller,
        filters: &ProjectListFilters,
        sort: ProjectCardSort,
        page: PageRequest,
    ) -> StorageResult<ProjectCatalog> {
        let params = CatalogParams::new(caller, filters);
        let (limit, offset) = page_window(page);
        let mut tx = self.read_transaction().await?;

        let count_sql = format!("{CATALOG} SELECT count(*) FROM matching");
        let (total,) = params
            .bind(sqlx::query_as::<_, (i64,)>(&count_sql))
            .fetch_one(&mut *tx)
            .await?;

        let page_sql = format!(
            "{CATALOG} SELECT id FROM matching ORDER BY {} LIMIT $8 OFFSET $9",
            catalog_order(sort)
        );
        let page_ids: Vec<Uuid> = params
            .bind(sqlx::query_as::<_, (Uuid,)>(&page_sql))
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *tx)
            .await?
            .into_iter()
            .map(|(id,)| id)
            .collect();

        let technologies_sql = format!(
            "{CATALOG} SELECT DISTINCT k.language FROM visible v \
             JOIN project_github_repos r ON r.project_id = v.id \
             JOIN github_repos g ON g.id = r.repo_id \
             CROSS JOIN LATERAL jsonb_object_keys(g.languages) AS k(language)"
        );
        let technologies: BTreeSet<String> = params
            .bind(sqlx::query_as::<_, (String,)>(&technologies_sql))
            .fetch_all(&mut *tx)
            .await?
            .into_iter()
            .map(|(language,)| language)
            .collect();

        let sponsors_sql = format!(
            "{CATALOG} SELECT DISTINCT s.id, s.name, s.logo_url, s.url FROM visible v \
             JOIN project_sponsors ps ON ps.project_id = v.id \
             JOIN sponsors s ON s.id = ps.sponsor_id"
        );
        let mut sponsors: Vec<SponsorView> = params
            .bind(sqlx::query_as::<_, (Uuid, String, Option<String>, Option<String>)>(
                &sponsors_sql,
            ))
            .fetch_all(&mut *tx)
            .await?
            .into_iter()
            .map(|(id, name, logo_url, url)| SponsorView {
                id: id.into(),
                name,
                logo_url,
                url,
            })
            .collect();
        sponsors.sort_by(|a, b| cmp_upper(&a.name, &b.name).then_with(|| a.id.cmp(&b.id)));

        let mut data = Dataset::default();
        load_project_rows(&mut tx, &mut data, &page_ids).await?;
        load_memberships(&mut tx, &mut data, &page_ids).await?;
        load_repos(&mut tx, &mut data, &[]).await?;
        load_people(&mut tx, &mut data, false).await?;
        tx.commit().await?;

        let page_ids: Vec<ProjectId> = page_ids.into_iter().map(ProjectId::from).collect();
        let cards = query::projects::project_cards(&data, caller, &page_ids);
        Ok(ProjectCatalog {
            projects: Page::new(cards, total, page),
            technologies: technologies.into_iter().collect(),
            sponsors,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn project_budgets(&self, project_id: ProjectId) -> StorageResult<BudgetsView> {
        let data = self.load(Scope::Project(project_id), Rows::BUDGETS).await?;
        Ok(query::budgets::project_budgets(&data, project_id))
    }

    #[tracing::instrument(skip(self))]
    async fn project_contributors(
        &self,
        project_id: ProjectId,
        login: Option<&str>,
        sort: ContributorSort,
        direction: SortDirection,
        page: PageRequest,
    ) -> StorageResult<Page<ContributorView>> {
        let data = self.load(Scope::Project(project_id), Rows::GITHUB).await?;
        Ok(query::contributors::project_contributors(
            &data, project_id, login, sort, direction, page,
        ))
    }

    #[tracing::instrument(skip(self))]
    async fn project_contributors_for_lead(
        &self,
        project_id: ProjectId,
        login: Option<&str>,
        sort: ContributorSort,
        direction: SortDirection,
        page: PageRequest,
    ) -> StorageResult<Page<LeadContributorView>> {
        let data = self.load(Scope::Project(project_id), Rows::EARNINGS).await?;
        Ok(query::contributors::project_contributors_for_lead(
            &data, project_id, login, sort, direction, page,
        ))
    }

    #[tracing::instrument(skip(self))]
    async fn project_rewards(
        &self,
        project_id: ProjectId,
        sort: RewardSort,
        direction: SortDirection,
        page: PageRequest,
    ) -> StorageResult<Page<RewardView>> {
        let data = self
            .load(Scope::Project(project_id), Rows::REWARD_STATUSES)
            .await?;
        Ok(query::rewards::project_rewards(
            &data, project_id, sort, direction, page,
        ))
    }

    #[tracing::instrument(skip(self))]
    async fn project_reward(
        &self,
        project_id: ProjectId,
        reward_id: RewardId,
    ) -> StorageResult<Option<RewardDetailsView>> {
        let data = self
            .load(Scope::Reward(reward_id), Rows::REWARD_STATUSES)
            .await?;
        Ok(query::rewards::project_reward(&data, project_id, reward_id))
    }

    #[tracing::instrument(skip(self))]
    async fn project_reward_items(
        &self,
        project_id: ProjectId,
        reward_id: RewardId,
        page: PageRequest,
    ) -> StorageResult<Option<Page<RewardItemView>>> {
        let data = self.load(Scope::Reward(reward_id), Rows::EARNINGS).await?;
        if !query::rewards::reward_in_project(&data, project_id, reward_id) {
            return Ok(None);
        }
        Ok(Some(query::rewards::reward_items(&data, reward_id, page)))
    }

    #[tracing::instrument(skip(self))]
    async fn rewardable_items(
        &self,
        project_id: ProjectId,
        contributor_id: GithubUserId,
        filters: &RewardableItemFilters,
        page: PageRequest,
    ) -> StorageResult<Page<RewardableItemView>> {
        let data = self.load(Scope::Project(project_id), Rows::GITHUB).await?;
        Ok(query::rewardable::rewardable_items(
            &data,
            project_id,
            contributor_id,
            filters,
            page,
        ))
    }

    #[tracing::instrument(skip(self))]
    async fn set_ignored_contributions(
        &self,
        project_id: ProjectId,
        contribution_ids: &[String],
        ignored: bool,
    ) -> StorageResult<()> {
        sqlx::query(
            "INSERT INTO ignored_contributions (project_id, contribution_id, ignored) \
             SELECT $1, unnest($2::text[]), $3 \
             ON CONFLICT (project_id, contribution_id) DO UPDATE SET ignored = EXCLUDED.ignored",
        )
        .bind(project_id.as_uuid())
        .bind(contribution_ids)
        .bind(ignored)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, command), fields(name = %command.name))]
    async fn create_project(
        &self,
        command: &CreateProjectCommand,
        creator: UserId,
    ) -> StorageResult<ProjectDetailsView> {
        let slug = project_slug(&command.name)?;
        let project_id = ProjectId::new();
        let id = *project_id.as_uuid();
        let settings = command.reward_settings.clone().unwrap_or_default();

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO projects (id, slug, name, short_description, long_description, logo_url, \
             more_info_url, hiring, visibility, rank) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 0)",
        )
        .bind(id)
        .bind(&slug)
        .bind(&command.name)
        .bind(&command.short_description)
        .bind(&command.long_description)
        .bind(&command.logo_url)
        .bind(&command.more_info_url)
        .bind(command.hiring)
        .bind(encode(&ProjectVisibility::Public))
        .execute(&mut *tx)
        .await
        .map_err(|e| conflict_on_slug(e, &slug))?;
        write_reward_settings(&mut tx, id, &settings).await?;
        sqlx::query("INSERT INTO project_leads (project_id, user_id) VALUES ($1, $2)")
            .bind(id)
            .bind(creator.as_uuid())
            .execute(&mut *tx)
            .await?;
        replace_invitations(&mut tx, id, &command.github_user_ids_to_invite).await?;
        replace_repos(&mut tx, id, &command.github_repo_ids).await?;
        tx.commit().await?;

        let data = self.load(Scope::Project(project_id), Rows::PROJECT_PAGE).await?;
        query::projects::project_details(&data, project_id)
            .ok_or_else(|| MarketplaceError::Internal(format!("project {project_id} vanished")))
    }

    #[tracing::instrument(skip(self, command))]
    async fn update_project(
        &self,
        project_id: ProjectId,
        command: &UpdateProjectCommand,
    ) -> StorageResult<()> {
        let slug = command.name.as_deref().map(project_slug).transpose()?;
        let id = *project_id.as_uuid();
        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query(
            "UPDATE projects SET name = COALESCE($2, name), slug = COALESCE($3, slug), \
             short_description = COALESCE($4, short_description), \
             long_description = COALESCE($5, long_description), \
             more_info_url = COALESCE($6, more_info_url), logo_url = COALESCE($7, logo_url), \
             hiring = COALESCE($8, hiring) WHERE id = $1",
        )
        .bind(id)
        .bind(&command.name)
        .bind(&slug)
        .bind(&command.short_description)
        .bind(&command.long_description)
        .bind(&command.more_info_url)
        .bind(&command.logo_url)
        .bind(command.hiring)
        .execute(&mut *tx)
        .await
        .map_err(|e| conflict_on_slug(e, slug.as_deref().unwrap_or_default()))?;
        if updated.rows_affected() == 0 {
            return Err(MarketplaceError::NotFound(format!(
                "Project {project_id} not found"
            )));
        }
        if let Some(settings) = &command.reward_settings {
            write_reward_settings(&mut tx, id, settings).await?;
        }
        if let Some(keep) = &command.leaders_to_keep {
            sqlx::query("DELETE FROM project_leads WHERE project_id = $1 AND NOT (user_id = ANY($2))")
                .bind(id)
                .bind(uuids(keep.iter().copied()))
                .execute(&mut *tx)
                .await?;
        }
        if let Some(invitees) = &command.github_user_ids_to_invite {
            replace_invitations(&mut tx, id, invitees).await?;
        }
        if let Some(repo_ids) = &command.github_repo_ids {
            replace_repos(&mut tx, id, repo_ids).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn accept_lead_invitation(
        &self,
        project_id: ProjectId,
        user: &AuthenticatedUser,
    ) -> StorageResult<bool> {
        let mut tx = self.pool.begin().await?;
        let removed = sqlx::query(
            "DELETE FROM pending_project_leader_invitations \
             WHERE project_id = $1 AND github_user_id = $2",
        )
        .bind(project_id.as_uuid())
        .bind(user.github_user_id)
        .execute(&mut *tx)
        .await?;
        if removed.rows_affected() == 0 {
            return Ok(false);
        }
        sqlx::query(
            "INSERT INTO project_leads (project_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(project_id.as_uuid())
        .bind(user.user_id.as_uuid())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(true)
    }
}

#[async_trait]
impl ContributionStorage for PostgresStorage {
    #[tracing::instrument(skip(self))]
    async fn contributions(
        &self,
        contributor_id: GithubUserId,
        filters: &ContributionFilters,
        sort: ContributionSort,
        direction: SortDirection,
        page: PageRequest,
    ) -> StorageResult<Page<ContributionView>> {
        let data = self
            .load(Scope::Contributor(contributor_id), Rows::EARNINGS)
            .await?;
        Ok(query::contributions::list_contributions(
            &data,
            contributor_id,
            filters,
            sort,
            direction,
            page,
        ))
    }

    #[tracing::instrument(skip(self))]
    async fn contribution_author(
        &self,
        project_id: ProjectId,
        contribution_id: &str,
    ) -> StorageResult<Option<GithubUserId>> {
        let author = sqlx::query_scalar::<_, i64>(
            "SELECT c.contributor_id FROM contributions c \
             JOIN project_github_repos pgr ON pgr.repo_id = c.repo_id \
             WHERE pgr.project_id = $1 AND c.id = $2",
        )
        .bind(project_id.as_uuid())
        .bind(contribution_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(author)
    }

    #[tracing::instrument(skip(self))]
    async fn contribution_details(
        &self,
        project_id: ProjectId,
        contribution_id: &str,
    ) -> StorageResult<Option<ContributionDetailsView>> {
        let data = self
            .load(Scope::Project(project_id), Rows::WORK_AND_STATUSES)
            .await?;
        Ok(query::contributions::contribution_details(
            &data,
            project_id,
            contribution_id,
        ))
    }

    #[tracing::instrument(skip(self))]
    async fn contributed_projects(
        &self,
        contributor_id: GithubUserId,
        filters: &ContributionFilters,
    ) -> StorageResult<Vec<ProjectLink>> {
        let mut tx = self.read_transaction().await?;
        let data = load_contributed(&mut tx, contributor_id).await?;
        tx.commit().await?;
        Ok(query::contributions::contributed_projects(
            &data,
            contributor_id,
            filters,
        ))
    }

    #[tracing::instrument(skip(self))]
    async fn contributed_repos(
        &self,
        contributor_id: GithubUserId,
        filters: &ContributionFilters,
    ) -> StorageResult<Vec<GithubRepoLink>> {
        let mut tx = self.read_transaction().await?;
        let data = load_contributed(&mut tx, contributor_id).await?;
        tx.commit().await?;
        Ok(query::contributions::contributed_repos(
            &data,
            contributor_id,
            filters,
        ))
    }

    #[tracing::instrument(skip(self))]
    async fn find_issue(
        &self,
        owner: &str,
        repo: &str,
        number: i64,
    ) -> StorageResult<Option<RewardableItemView>> {
        let scope = Scope::Repo {
            owner: owner.to_string(),
            name: repo.to_string(),
        };
        let data = self.load(scope, Rows::GITHUB).await?;
        Ok(query::rewardable::find_issue(&data, owner, repo, number))
    }

    #[tracing::instrument(skip(self))]
    async fn find_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: i64,
    ) -> StorageResult<Option<RewardableItemView>> {
        let scope = Scope::Repo {
            owner: owner.to_string(),
            name: repo.to_string(),
        };
        let data = self.load(scope, Rows::GITHUB).await?;
        Ok(query::rewardable::find_pull_request(
            &data, owner, repo, number,
        ))
    }
}

#[async_trait]
impl UserStorage for PostgresStorage {
    #[tracing::instrument(skip(self))]
    async fn user_rewards(
        &self,
        recipient_id: GithubUserId,
        sort: RewardSort,
        direction: SortDirection,
        page: PageRequest,
    ) -> StorageResult<UserRewardsPage> {
        let data = self
            .load(Scope::Recipient(recipient_id), Rows::REWARD_STATUSES)
            .await?;
        Ok(query::rewards::user_rewards(
            &data,
            recipient_id,
            sort,
            direction,
            page,
        ))
    }

    #[tracing::instrument(skip(self))]
    async fn user_reward(
        &self,
        reward_id: RewardId,
    ) -> StorageResult<Option<(GithubUserId, RewardDetailsView)>> {
        let data = self
            .load(Scope::Reward(reward_id), Rows::REWARD_STATUSES)
            .await?;
        Ok(query::rewards::user_reward(&data, reward_id))
    }

    #[tracing::instrument(skip(self))]
    async fn reward_items(
        &self,
        reward_id: RewardId,
        page: PageRequest,
    ) -> StorageResult<Page<RewardItemView>> {
        let data = self.load(Scope::Reward(reward_id), Rows::EARNINGS).await?;
        Ok(query::rewards::reward_items(&data, reward_id, page))
    }
}
