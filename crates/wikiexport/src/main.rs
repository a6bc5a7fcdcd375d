use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use wikiexport_core::commands::{self, Command};
use wikiexport_core::config::load_config;
use wikiexport_core::log::RunLog;
use wikiexport_core::pipeline::{RunSummary, run_export};
use wikiexport_core::runtime::{
    PathOverrides, ResolutionContext, normalize_for_display, resolve_config_path, resolve_paths,
};
use wikiexport_core::writers::WriterOptions;

const FIXED_ARGS: usize = 3;

#[derive(Debug, Parser)]
#[command(
    name = "wikiexport",
    version,
    about = "Exports spells, feats and monsters from a Pathfinder-fr wiki dump"
)]
struct Cli {
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    #[arg(long, value_name = "PATH", help = "Directory overriding the embedded lists")]
    lists_dir: Option<PathBuf>,
    #[arg(long, help = "Print resolved runtime diagnostics")]
    diagnostics: bool,
    #[arg(
        value_name = "ARGS",
        trailing_var_arg = true,
        help = "<in> <out> <command> [<command>]* [/option[:value]]*"
    )]
    args: Vec<String>,
}

/// Positional arguments once the `/name[:value]` options are split out.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Invocation {
    input: PathBuf,
    output: PathBuf,
    commands: Vec<String>,
    options: BTreeMap<String, String>,
}

impl Invocation {
    /// `None` means the usage text should be shown instead.
    fn parse(args: &[String]) -> Option<Self> {
        if args.len() < FIXED_ARGS || args.iter().any(|arg| arg.eq_ignore_ascii_case("/help")) {
            return None;
        }

        let mut commands = vec![args[2].clone()];
        let mut options = BTreeMap::new();
        for arg in &args[FIXED_ARGS..] {
            let Some(option) = arg.strip_prefix('/') else {
                commands.push(arg.clone());
                continue;
            };
            if option.is_empty() {
                continue;
            }
            let (name, value) = match option.split_once(':') {
                Some((name, value)) if !name.is_empty() => (name, value),
                _ => (option, ""),
            };
            options
                .entry(name.to_lowercase())
                .or_insert_with(|| value.to_string());
        }

        Some(Self {
            input: PathBuf::from(&args[0]),
            output: PathBuf::from(&args[1]),
            commands,
            options,
        })
    }

    fn has_option(&self, name: &str) -> bool {
        self.options.contains_key(name)
    }

    fn log_file(&self) -> Option<PathBuf> {
        self.options
            .get("log")
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
    }

    /// Known commands in argument order; unknown names are skipped.
    fn resolve_commands(&self) -> Vec<Box<dyn Command>> {
        let mut resolved: Vec<Box<dyn Command>> = Vec::new();
        for name in &self.commands {
            match commands::find(name) {
                Some(command) => resolved.push(command),
                None => tracing::warn!("unknown command ignored: {name}"),
            }
        }
        resolved
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    println!(
        "Pathfinder-fr Wiki Export Parser v{}",
        env!("CARGO_PKG_VERSION")
    );

    let Some(invocation) = Invocation::parse(&cli.args) else {
        print_usage();
        return Ok(());
    };
    println!();

    if !invocation.input.is_dir() {
        println!(
            "ERREUR: Le dossier spécifié {} n'existe pas",
            normalize_for_display(&invocation.input)
        );
        return Ok(());
    }

    run(&cli, &invocation)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run(cli: &Cli, invocation: &Invocation) -> Result<()> {
    let context = ResolutionContext::from_process()?;
    let overrides = PathOverrides {
        input_dir: Some(invocation.input.clone()),
        output_dir: Some(invocation.output.clone()),
        config: cli.config.clone(),
        lists_dir: cli.lists_dir.clone(),
        log_file: invocation.log_file(),
    };
    let (config_path, _) = resolve_config_path(&context, &overrides);
    let config = load_config(&config_path)?;
    let paths = resolve_paths(&context, &overrides, &config)?;
    if cli.diagnostics {
        println!("[diagnostics]\n{}\n", paths.diagnostics());
    }

    let commands = invocation.resolve_commands();
    println!("Commandes à exécuter :");
    for command in &commands {
        println!("- {}", command.alias());
    }

    let mut options = WriterOptions::from_config(&config.output);
    options.json |= invocation.has_option("json");
    options.csv |= invocation.has_option("csv");

    let mut log = match paths.log_file.as_deref() {
        Some(path) => RunLog::with_file(path)?,
        None => RunLog::new(),
    };

    println!("Chargement de l'export wiki...");
    let result = run_export(&paths, &config, &commands, &options, &mut log);
    log.flush()?;
    let summary = result?;

    print_summary(&summary, &paths.output_dir, log.file_path());
    Ok(())
}

fn print_summary(summary: &RunSummary, output_dir: &Path, log_file: Option<&Path>) {
    println!();
    println!("pages: {}", summary.pages);
    for report in &summary.reports {
        println!("command.{}: {}", report.alias, report.count);
    }
    if summary.data_sets.is_empty() {
        println!("datasets: <empty>");
    } else {
        println!("datasets: {}", summary.data_sets.join(", "));
    }
    println!("files_written: {}", summary.files.len());
    println!("output_dir: {}", normalize_for_display(output_dir));
    if let Some(path) = log_file {
        println!("log_file: {}", normalize_for_display(path));
    }
    println!("warnings: {}", summary.warnings);
    println!("errors: {}", summary.errors);
}

fn print_usage() {
    println!("usage: wikiexport <in> <out> <command> [<command>]* <options...>");
    println!();
    println!(" in       Chemin (dossier) contenant les espaces de nom des fichiers du wiki.");
    println!("          Il s'agit en général d'un dossier \"Out\" extrait depuis le fichier");
    println!("          d'export wiki disponible à l'adresse http://db.pathfinder-fr.org/raw/WikiXml.7z");
    println!(" out      Dossier où les fichiers XML seront générés.");
    println!(" command  Commande(s) à exécuter.");
    println!(" options  Options supplémentaires");
    println!();
    println!("Commandes disponibles :");
    println!();
    let all = commands::all_commands();
    let width = all.iter().map(|command| command.alias().len()).max().unwrap_or(0);
    for command in &all {
        println!(" {:<width$} {}", command.alias(), command.help());
    }
    println!();
    println!("Options disponibles :");
    println!();
    println!(" /log:[file]  Ecrit le journal de génération des données dans le fichier indiqué");
    println!(" /csv         Génère les données au format CSV. Par défaut, les données ne sont générées qu'au format XML");
    println!(" /json        Génère les données au format JSON");
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::Invocation;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn parse_splits_commands_and_options() {
        let invocation = Invocation::parse(&args(&[
            "Out",
            "Data",
            "spells",
            "/CSV",
            "feats",
            "/log:run.log",
            "/log:other.log",
            "/",
        ]))
        .expect("invocation");

        assert_eq!(invocation.input, PathBuf::from("Out"));
        assert_eq!(invocation.output, PathBuf::from("Data"));
        assert_eq!(invocation.commands, vec!["spells", "feats"]);
        assert!(invocation.has_option("csv"));
        assert!(!invocation.has_option("json"));
        assert_eq!(invocation.log_file(), Some(PathBuf::from("run.log")));
    }

    #[test]
    fn parse_requests_usage() {
        assert!(Invocation::parse(&args(&["Out", "Data"])).is_none());
        assert!(Invocation::parse(&args(&["Out", "Data", "spells", "/HELP"])).is_none());
    }

    #[test]
    fn unknown_commands_are_skipped() {
        let invocation =
            Invocation::parse(&args(&["Out", "Data", "Monsters", "items", "/log"])).expect("invocation");
        let aliases: Vec<&str> = invocation
            .resolve_commands()
            .iter()
            .map(|command| command.alias())
            .collect();
        assert_eq!(aliases, vec!["monsters"]);
        assert_eq!(invocation.log_file(), None);
    }
}
