use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use learner_dashboard::auth::{self, Credentials};
use learner_dashboard::config::{self, Config, DEFAULT_DOMAIN, DEFAULT_GAMES_RESULT_ID};
use learner_dashboard::dashboard::{self, DashboardOptions, Loaded, Subject};
use learner_dashboard::export::{self, Dataset};
use learner_dashboard::graphql::GraphqlClient;
use learner_dashboard::report::{self, ProgramView};
use learner_dashboard::session::{SessionStore, SEARCHED_USER_ID};
use learner_dashboard::stats::games::{self, Game};
use learner_dashboard::stats::heatmap::{self, Heatmap};
use learner_dashboard::stats::programs::{self, Program, DEFAULT_CAMPUS};
use learner_dashboard::stats::teamwork::{Teamwork, TeamworkFilter};
use learner_dashboard::stats::{participants, progress};

#[derive(Parser)]
#[command(name = "learner-dashboard")]
#[command(about = "Personal learning-platform dashboard for the terminal", long_about = None)]
struct Cli {
    /// Platform host, or a full origin such as http://127.0.0.1:8080
    #[arg(long, global = true, env = "DASHBOARD_DOMAIN", default_value = DEFAULT_DOMAIN)]
    domain: String,
    /// Campus root that program paths start with
    #[arg(long, global = true, env = "DASHBOARD_CAMPUS", default_value = DEFAULT_CAMPUS)]
    campus: String,
    /// Session file [default: <config dir>/learner-dashboard/session.json]
    #[arg(long, global = true, env = "DASHBOARD_SESSION")]
    session: Option<PathBuf>,
    /// Result row holding the mini-game attributes
    #[arg(long, global = true, default_value_t = DEFAULT_GAMES_RESULT_ID)]
    games_result_id: i64,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SubjectArgs {
    /// Look at another participant by login
    #[arg(long)]
    user: Option<String>,
    /// Go back to your own data
    #[arg(long, conflicts_with = "user")]
    me: bool,
}

#[derive(Args)]
struct TeamworkArgs {
    #[command(flatten)]
    subject: SubjectArgs,
    /// Skip groups with a failed audit
    #[arg(long)]
    succeeded_only: bool,
}

impl TeamworkArgs {
    fn filter(&self) -> TeamworkFilter {
        if self.succeeded_only {
            TeamworkFilter::SucceededOnly
        } else {
            TeamworkFilter::AllFinished
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and cache the token and profile
    Login {
        #[arg(long, env = "DASHBOARD_USERNAME")]
        username: String,
        #[arg(long, env = "DASHBOARD_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the cached session
    Logout,
    /// Print your profile
    Profile,
    /// Render the full dashboard as markdown
    Report {
        #[command(flatten)]
        teamwork: TeamworkArgs,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Render one detail view
    Show {
        #[command(subcommand)]
        view: View,
    },
    /// Search participants by login or name
    Search { term: String },
    /// Write derived data as CSV
    Export {
        #[arg(value_enum)]
        dataset: Dataset,
        #[command(flatten)]
        subject: SubjectArgs,
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
enum View {
    /// XP, level or recent transactions of one program
    Program {
        #[arg(value_enum)]
        program: Program,
        #[arg(long, value_enum, default_value_t = ProgramView::Xp)]
        view: ProgramView,
    },
    /// Audit ratio with done and received amounts
    AuditRatio,
    /// Succeeded and failed audit counts
    Audits,
    /// Passed projects
    Succeeded,
    /// Failed projects grouped by name
    Failed,
    /// Mini-game statistics
    Game {
        #[arg(value_enum)]
        game: Game,
    },
    /// Everyone you finished a project with
    Teammates(TeamworkArgs),
    /// Projects finished in a team
    TeamProjects(TeamworkArgs),
    /// Projects finished alone
    Solo(TeamworkArgs),
    /// Transactions behind one heatmap cell
    Heat {
        /// Weekday, e.g. mon or tuesday
        day: String,
        #[arg(value_parser = clap::value_parser!(u8).range(0..24))]
        hour: u8,
        #[command(flatten)]
        subject: SubjectArgs,
    },
    /// XP earned on one day
    Day {
        date: NaiveDate,
        #[command(flatten)]
        subject: SubjectArgs,
    },
}

/// Clears the session when the backend no longer accepts the token.
async fn checked<T>(session: &mut SessionStore, result: Loaded<T>) -> anyhow::Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(err) if err.is_unauthenticated() => {
            force_logout(session).await?;
            bail!("session expired ({err}); run `learner-dashboard login` again")
        }
        Err(err) => Err(err.into()),
    }
}

async fn force_logout(session: &mut SessionStore) -> anyhow::Result<()> {
    warn!("token rejected, clearing session");
    session.clear();
    session.persist().await
}

fn signed_in(session: &SessionStore) -> anyhow::Result<String> {
    session
        .token()
        .map(str::to_string)
        .context("not signed in; run `learner-dashboard login` first")
}

/// Picks whose data user-scoped views show. `--user` is remembered in the
/// session until `--me` or the next login.
async fn resolve_subject(
    session: &mut SessionStore,
    client: &GraphqlClient,
    token: &str,
    args: &SubjectArgs,
) -> anyhow::Result<Subject> {
    if args.me && session.remove(SEARCHED_USER_ID).is_some() {
        session.persist().await?;
    }

    if let Some(login) = &args.user {
        let users = checked(session, dashboard::fetch_participants(client, token).await).await?;
        let user = match participants::find_login(&users, login) {
            Some(user) => user,
            None => bail!("no participant with login {login}"),
        };
        info!(login = %user.login, id = user.id, "switching subject");
        session.set(SEARCHED_USER_ID, user.id.to_string());
        session.persist().await?;
        return Ok(Subject {
            user_id: user.id,
            login: Some(user.login.clone()),
        });
    }

    if let Some(user_id) = session.searched_user_id() {
        return Ok(Subject {
            user_id,
            login: None,
        });
    }

    let user_id = session
        .current_user_id()
        .context("session has no user id; run `learner-dashboard login` again")?;
    Ok(Subject {
        user_id,
        login: session.profile().map(|profile| profile.login),
    })
}

async fn load_teamwork(
    session: &mut SessionStore,
    client: &GraphqlClient,
    token: &str,
    args: &TeamworkArgs,
) -> anyhow::Result<Teamwork> {
    let subject = resolve_subject(session, client, token, &args.subject).await?;
    let teamwork = dashboard::load_teamwork(client, token, subject.user_id, args.filter()).await;
    checked(session, teamwork).await
}

async fn show(
    config: &Config,
    session: &mut SessionStore,
    client: &GraphqlClient,
    view: View,
) -> anyhow::Result<String> {
    let token = signed_in(session)?;
    let rendered = match view {
        View::Program { program, view } => {
            let rules = config.program_rules();
            let (stats, transactions) = match view {
                ProgramView::Transactions => {
                    let transactions =
                        checked(session, dashboard::fetch_xp_transactions(client, &token).await)
                            .await?;
                    (
                        programs::program_stats(&rules, program, &transactions, &[]),
                        transactions,
                    )
                }
                ProgramView::Xp | ProgramView::Level => {
                    let stats =
                        dashboard::load_program(client, &token, &rules, program).await;
                    (checked(session, stats).await?, Vec::new())
                }
            };
            let selected = rules.select(program, &transactions);
            report::program_view(view, &stats, &selected)
        }
        View::AuditRatio => {
            let breakdown = dashboard::load_audit_breakdown(client, &token).await;
            report::audit_ratio_view(&checked(session, breakdown).await?)
        }
        View::Audits => {
            let counts = dashboard::fetch_audit_counts(client, &token).await;
            report::audits_view(&checked(session, counts).await?)
        }
        View::Succeeded => {
            let outcomes = dashboard::load_projects(client, &token).await;
            report::succeeded_projects_view(&checked(session, outcomes).await?.succeeded)
        }
        View::Failed => {
            let outcomes = dashboard::load_projects(client, &token).await;
            report::failed_projects_view(&checked(session, outcomes).await?.failed)
        }
        View::Game { game } => {
            let records = dashboard::fetch_games(client, &token, config.games_result_id).await;
            let records = checked(session, records).await?;
            report::game_view(game, games::game_stats(&records, game).as_ref())
        }
        View::Teammates(args) => {
            report::teammates_view(&load_teamwork(session, client, &token, &args).await?)
        }
        View::TeamProjects(args) => {
            report::team_projects_view(&load_teamwork(session, client, &token, &args).await?)
        }
        View::Solo(args) => {
            report::solo_projects_view(&load_teamwork(session, client, &token, &args).await?)
        }
        View::Heat { day, hour, subject } => {
            let day_row = match heatmap::day_index(&day) {
                Some(row) => row,
                None => bail!("unknown weekday {day}"),
            };
            let subject = resolve_subject(session, client, &token, &subject).await?;
            let transactions = dashboard::fetch_user_xp(client, &token, subject.user_id).await;
            let heatmap = Heatmap::build(&checked(session, transactions).await?, &Local);
            report::heat_cell_view(&heatmap, day_row, usize::from(hour))
        }
        View::Day { date, subject } => {
            let subject = resolve_subject(session, client, &token, &subject).await?;
            let transactions = dashboard::fetch_user_xp(client, &token, subject.user_id).await;
            let series = progress::cumulative_xp(&checked(session, transactions).await?, &Local);
            report::day_view(date, progress::day(&series, date))
        }
    };
    Ok(rendered)
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = Config::new(
        cli.domain,
        cli.campus,
        cli.session.unwrap_or_else(config::default_session_path),
    )
    .with_games_result_id(cli.games_result_id);
    let mut session = SessionStore::load(&config.session_path).await;
    let client = GraphqlClient::new(config.graphql_url());

    match cli.command {
        Commands::Login { username, password } => {
            let credentials = Credentials { username, password };
            let token = auth::sign_in(&reqwest::Client::new(), &config.auth_url(), &credentials)
                .await
                .context("sign-in failed")?;
            let profile = dashboard::fetch_profile(&client, &token)
                .await
                .context("signed in but the profile could not be loaded")?;
            session.store_login(&token, &profile)?;
            session.persist().await?;
            println!("Signed in as {}.", profile.login);
        }
        Commands::Logout => {
            session.clear();
            session.persist().await?;
            println!("Signed out.");
        }
        Commands::Profile => {
            let token = signed_in(&session)?;
            let profile = match dashboard::fetch_profile(&client, &token).await {
                Err(err) if !err.is_unauthenticated() => {
                    warn!("profile query failed, using cached profile: {err}");
                    match session.profile() {
                        Some(profile) => profile,
                        None => return Err(err).context("failed to load profile"),
                    }
                }
                result => checked(&mut session, result).await?,
            };
            print!("{}", report::profile_view(&profile));
        }
        Commands::Report { teamwork, out } => {
            let token = signed_in(&session)?;
            let subject = resolve_subject(&mut session, &client, &token, &teamwork.subject).await?;
            let options = DashboardOptions {
                games_result_id: config.games_result_id,
                teamwork_filter: teamwork.filter(),
            };
            let loaded = dashboard::load_dashboard(
                &client,
                &token,
                &config.program_rules(),
                subject,
                &options,
                &Local,
            )
            .await;
            if loaded.session_expired() {
                force_logout(&mut session).await?;
                bail!("session expired; run `learner-dashboard login` again");
            }
            if loaded.failed_widgets() > 0 {
                warn!(failed = loaded.failed_widgets(), "some widgets could not be loaded");
            }

            let rendered = report::build_report(&loaded);
            match out {
                Some(out) => {
                    tokio::fs::write(&out, rendered)
                        .await
                        .with_context(|| format!("failed to write {}", out.display()))?;
                    println!("Report written to {}.", out.display());
                }
                None => print!("{rendered}"),
            }
        }
        Commands::Show { view } => {
            let rendered = show(&config, &mut session, &client, view).await?;
            print!("{rendered}");
        }
        Commands::Search { term } => {
            let token = signed_in(&session)?;
            let users = checked(&mut session, dashboard::fetch_participants(&client, &token).await)
                .await?;
            let matches = participants::search(&users, &term);
            print!("{}", report::search_view(&term, &matches));
        }
        Commands::Export {
            dataset,
            subject,
            out,
        } => {
            let token = signed_in(&session)?;
            let subject = resolve_subject(&mut session, &client, &token, &subject).await?;
            let transactions = dashboard::fetch_user_xp(&client, &token, subject.user_id).await;
            let transactions = checked(&mut session, transactions).await?;

            let file = export::create_file(&out)?;
            let rows = match dataset {
                Dataset::Xp => {
                    export::write_progress(file, &progress::cumulative_xp(&transactions, &Local))?
                }
                Dataset::Heatmap => {
                    export::write_heatmap(file, &Heatmap::build(&transactions, &Local))?
                }
            };
            println!("Wrote {rows} rows to {}.", out.display());
        }
    }

    Ok(())
}
