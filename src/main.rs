use clap::Parser;
use miette::Result;
use mrt::cli::{Cli, Commands};

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    // This is standard practice for CLI tools that output to stdout.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    // Install miette's fancy error handler for beautiful diagnostics
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;

    match cli.command {
        Commands::Init(args) => mrt::cli::commands::init::run(args),
        Commands::Eqp(cmd) => mrt::cli::commands::eqp::run(cmd, &global),
        Commands::Rdg(cmd) => mrt::cli::commands::rdg::run(cmd, &global),
        Commands::Flr(cmd) => mrt::cli::commands::flr::run(cmd),
        Commands::Calib(cmd) => mrt::cli::commands::calib::run(cmd),
        Commands::Report(cmd) => mrt::cli::commands::report::run(cmd),
        Commands::Validate(args) => mrt::cli::commands::validate::run(args),
        Commands::Status(args) => mrt::cli::commands::status::run(args, &global),
        Commands::Config(cmd) => mrt::cli::commands::config::run(cmd, &global),
        Commands::Completions(args) => mrt::cli::commands::completions::run(args),
    }
}
