//! `mrt init` command - Initialize a new MRT project

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::Path;

use crate::analytics::calibration::Calibration;
use crate::core::project::{Project, ProjectError};

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: std::path::PathBuf,

    /// Also initialize a git repository
    #[arg(long)]
    pub git: bool,

    /// Force initialization even if .mrt/ already exists
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs) -> Result<()> {
    let path = if args.path.as_os_str() == "." {
        std::env::current_dir().into_diagnostic()?
    } else {
        args.path.clone()
    };

    // Create directory if it doesn't exist
    if !path.exists() {
        std::fs::create_dir_all(&path).into_diagnostic()?;
        println!(
            "{} Created directory {}",
            style("✓").green(),
            style(path.display()).cyan()
        );
    }

    // Initialize git if requested
    if args.git {
        init_git(&path)?;
    }

    // Initialize MRT project
    let project = if args.force {
        Project::init_force(&path)
    } else {
        Project::init(&path)
    };

    match project {
        Ok(project) => {
            write_calibration(&project)?;

            println!(
                "{} Initialized MRT project at {}",
                style("✓").green(),
                style(project.root().display()).cyan()
            );
            println!();
            println!("Created project structure:");
            print_structure(project.root());
            println!();
            println!("Next steps:");
            println!(
                "  {} Register your first equipment",
                style("mrt eqp new").yellow()
            );
            println!(
                "  {} Record a vibration reading",
                style("mrt rdg new").yellow()
            );
            println!(
                "  {} Validate project files",
                style("mrt validate").yellow()
            );
            Ok(())
        }
        Err(ProjectError::AlreadyExists(path)) => {
            println!(
                "{} MRT project already exists at {}",
                style("!").yellow(),
                style(path.display()).cyan()
            );
            println!();
            println!(
                "Use {} to reinitialize",
                style("mrt init --force").yellow()
            );
            Ok(())
        }
        Err(e) => Err(miette::miette!("{}", e)),
    }
}

/// Materialize the shipped calibration so projects carry their own copy
/// under version control from day one.
fn write_calibration(project: &Project) -> Result<()> {
    let calib_path = project.calibration_path();
    if calib_path.exists() {
        return Ok(());
    }

    let calibration = Calibration::shipped().map_err(|e| miette::miette!("{}", e))?;
    calibration
        .write(&calib_path)
        .map_err(|e| miette::miette!("{}", e))?;
    Ok(())
}

fn init_git(path: &Path) -> Result<()> {
    let git_dir = path.join(".git");
    if git_dir.exists() {
        println!(
            "{} Git repository already exists",
            style("✓").green()
        );
        return Ok(());
    }

    let output = std::process::Command::new("git")
        .arg("init")
        .current_dir(path)
        .output()
        .into_diagnostic()?;

    if output.status.success() {
        println!(
            "{} Initialized git repository",
            style("✓").green()
        );

        // Create .gitignore
        let gitignore_path = path.join(".gitignore");
        if !gitignore_path.exists() {
            std::fs::write(
                &gitignore_path,
                "# Editor backups\n*.swp\n*~\n",
            )
            .into_diagnostic()?;
        }
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(miette::miette!("Failed to initialize git: {}", stderr))
    }
}

fn print_structure(root: &Path) {
    let entries = [
        ".mrt/",
        ".mrt/config.yaml",
        ".mrt/calibration.yaml",
        "equipment/",
        "readings/",
        "failures/",
    ];

    for entry in entries {
        let full_path = root.join(entry);
        if full_path.exists() {
            let prefix = if entry.ends_with('/') { "📁" } else { "📄" };
            println!("  {} {}", prefix, style(entry).dim());
        }
    }
}
