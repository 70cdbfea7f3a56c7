use std::fmt;

use fitness_core::model::{CourseId, Workout};
use services::{ApiConfig, AppServices, AuthToken, Clock};
use tracing_subscriber::EnvFilter;
use vm::{AuthFormVm, AuthMode, CourseAction, CoursesVm, ViewError, WorkoutsVm};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArg { name: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidProgress { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArg { name } => write!(f, "missing <{name}>"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidProgress { raw } => write!(f, "invalid progress value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  fitness [--base-url <url>] [--token <token>] <command>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  courses [--mine]                          list the catalogue or your courses");
    eprintln!("  toggle <course-id>                        add or remove a course");
    eprintln!("  workouts <course-id>                      list a course's workouts in order");
    eprintln!("  progress <course-id>                      show course progress");
    eprintln!("  save <course-id> <workout-id> <value>...  save per-exercise percentages");
    eprintln!("  reset <course-id> <workout-id>            zero a workout's progress");
    eprintln!("  login <email> <password>                  sign in and print the token");
    eprintln!("  register <email> <password>               create an account and print the token");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  FITNESS_API_BASE_URL, FITNESS_API_TIMEOUT_SECS, FITNESS_TOKEN, RUST_LOG");
}

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Courses { mine: bool },
    Toggle { course_id: String },
    Workouts { course_id: String },
    Progress { course_id: String },
    Save {
        course_id: String,
        workout_id: String,
        values: Vec<f64>,
    },
    Reset { course_id: String, workout_id: String },
    Login { email: String, password: String },
    Register { email: String, password: String },
}

fn positional(
    args: &mut impl Iterator<Item = String>,
    name: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingArg { name })
}

fn no_more(args: &mut impl Iterator<Item = String>) -> Result<(), ArgsError> {
    match args.next() {
        Some(extra) => Err(ArgsError::UnknownArg(extra)),
        None => Ok(()),
    }
}

impl Command {
    fn parse(name: &str, args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let command = match name {
            "courses" => {
                let mut mine = false;
                for arg in args.by_ref() {
                    match arg.as_str() {
                        "--mine" => mine = true,
                        _ => return Err(ArgsError::UnknownArg(arg)),
                    }
                }
                Self::Courses { mine }
            }
            "toggle" => Self::Toggle {
                course_id: positional(args, "course-id")?,
            },
            "workouts" => Self::Workouts {
                course_id: positional(args, "course-id")?,
            },
            "progress" => Self::Progress {
                course_id: positional(args, "course-id")?,
            },
            "save" => {
                let course_id = positional(args, "course-id")?;
                let workout_id = positional(args, "workout-id")?;
                let values = args
                    .by_ref()
                    .map(|raw| {
                        raw.parse::<f64>()
                            .map_err(|_| ArgsError::InvalidProgress { raw })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Self::Save {
                    course_id,
                    workout_id,
                    values,
                }
            }
            "reset" => Self::Reset {
                course_id: positional(args, "course-id")?,
                workout_id: positional(args, "workout-id")?,
            },
            "login" => Self::Login {
                email: positional(args, "email")?,
                password: positional(args, "password")?,
            },
            "register" => Self::Register {
                email: positional(args, "email")?,
                password: positional(args, "password")?,
            },
            other => return Err(ArgsError::UnknownCommand(other.to_owned())),
        };
        no_more(args)?;
        Ok(command)
    }
}

struct Args {
    config: ApiConfig,
    token: Option<AuthToken>,
    command: Command,
}

impl Args {
    fn parse(argv: impl IntoIterator<Item = String>) -> Result<Option<Self>, ArgsError> {
        let mut config = ApiConfig::from_env();
        let mut token = std::env::var("FITNESS_TOKEN")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(AuthToken::new);

        let mut args = argv.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--base-url" => config.base_url = require_value(&mut args, "--base-url")?,
                "--token" => token = Some(AuthToken::new(require_value(&mut args, "--token")?)),
                "--help" | "-h" => return Ok(None),
                flag if flag.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                name => {
                    let command = Command::parse(name, &mut args)?;
                    return Ok(Some(Self {
                        config,
                        token,
                        command,
                    }));
                }
            }
        }
        Ok(None)
    }
}

fn print_workouts(workouts: &[Workout], vm: &WorkoutsVm) {
    for (index, workout) in workouts.iter().enumerate() {
        let mark = if vm.workout_completed_status(&workout.id) {
            "x"
        } else {
            " "
        };
        println!(
            "{:>2}. [{mark}] {}  ({}, {} exercises)",
            index + 1,
            workout.name.as_deref().unwrap_or("-"),
            workout.id,
            workout.exercise_count()
        );
    }
}

async fn sign_in(
    app: &AppServices,
    mode: AuthMode,
    email: String,
    password: String,
) -> Result<(), ViewError> {
    let mut form = AuthFormVm::new(mode);
    form.email = email;
    form.confirm_password.clone_from(&password);
    form.password = password;
    form.submit(&app.auth()).await?;
    if let Some(token) = app.auth().token() {
        println!("{}", token.as_str());
    }
    Ok(())
}

async fn execute(app: &AppServices, command: Command) -> Result<(), ViewError> {
    match command {
        Command::Courses { mine } => {
            let mut vm = CoursesVm::new(app);
            let courses = if mine {
                vm.load_user_courses().await?
            } else {
                vm.load_all_courses(false).await?
            };
            for course in courses {
                println!(
                    "{}  {}  ({} workouts)",
                    course.id,
                    course.display_name(),
                    course.workout_count()
                );
            }
        }
        Command::Toggle { course_id } => {
            let mut vm = CoursesVm::new(app);
            match vm.toggle_course(&course_id).await? {
                CourseAction::Added => println!("added {course_id}"),
                CourseAction::Removed => println!("removed {course_id}"),
            }
        }
        Command::Workouts { course_id } => {
            let mut vm = WorkoutsVm::new(app);
            vm.load_course_progress(&course_id).await?;
            let workouts = app
                .courses()
                .fetch_course_workouts(&CourseId::new(course_id))
                .await
                .map_err(|err| ViewError::from_api(&err, "Ошибка загрузки тренировок"))?;
            print_workouts(&workouts, &vm);
        }
        Command::Progress { course_id } => {
            let mut vm = WorkoutsVm::new(app);
            let view = vm.load_course_progress(&course_id).await?;
            let course_id = CourseId::new(course_id);
            println!(
                "{}/{} workouts completed ({:.0}%)",
                view.completed_count,
                view.total_workouts,
                vm.course_completion_percentage(&course_id)
            );
            for record in &view.workouts_progress {
                let values: Vec<String> =
                    record.progress_data.iter().map(ToString::to_string).collect();
                println!(
                    "  {}  [{}]{}",
                    record.workout_id,
                    values.join(", "),
                    if record.completed { "  done" } else { "" }
                );
            }
        }
        Command::Save {
            course_id,
            workout_id,
            values,
        } => {
            let mut vm = WorkoutsVm::new(app);
            let record = vm.save_progress(&course_id, &workout_id, values).await?;
            println!(
                "saved {}{}",
                record.workout_id,
                if record.completed { " (completed)" } else { "" }
            );
        }
        Command::Reset {
            course_id,
            workout_id,
        } => {
            let mut vm = WorkoutsVm::new(app);
            vm.reset_progress(&course_id, &workout_id).await?;
            println!("reset {workout_id}");
        }
        Command::Login { email, password } => {
            sign_in(app, AuthMode::Login, email, password).await?;
        }
        Command::Register { email, password } => {
            sign_in(app, AuthMode::Register, email, password).await?;
        }
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let parsed = match Args::parse(std::env::args().skip(1)) {
        Ok(Some(parsed)) => parsed,
        Ok(None) => {
            print_usage();
            return Ok(());
        }
        Err(err) => {
            print_usage();
            return Err(err.into());
        }
    };

    let restoring = parsed.token.is_some();
    let app = AppServices::http(&parsed.config, Clock::default(), parsed.token)?;
    if restoring {
        app.auth().fetch_user_data().await;
    }

    execute(&app, parsed.command).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
