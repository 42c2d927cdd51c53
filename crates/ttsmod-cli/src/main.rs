use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use ttsmod_core::{FsScriptStore, WriteOptions};

#[derive(Parser, Debug)]
#[command(
    name = "ttsmod",
    about = "Build Tabletop Simulator saves from a mod directory and unpack them again",
    version
)]
struct Cli {
    /// Log codec progress at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Assemble a save file from a mod directory
    Build(BuildArgs),
    /// Explode a save file into a mod directory
    Unpack(UnpackArgs),
    /// Decode only an object directory into a nested ObjectStates array
    ObjectsDecode(DecodeArgs),
    /// Encode only a nested ObjectStates array into an object directory
    ObjectsEncode(EncodeArgs),
    /// Print the root module of a luabundle script
    Unbundle(UnbundleArgs),
}

#[derive(ClapArgs, Debug)]
struct BuildArgs {
    /// Mod directory containing config.json
    mod_dir: PathBuf,
    /// Output save path (defaults to <MOD_DIR>/output.json)
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
struct UnpackArgs {
    /// Save file to read
    save: PathBuf,
    /// Mod directory to create or update
    mod_dir: PathBuf,
    /// Scripts longer than this many characters get their own file
    #[arg(long, default_value_t = 80)]
    threshold: usize,
    /// Zip and replace the output of an earlier unpack
    #[arg(long, default_value_t = false)]
    replace: bool,
}

#[derive(ClapArgs, Debug)]
struct DecodeArgs {
    /// Object directory
    dir: PathBuf,
    /// Directory scripts are read from
    #[arg(long)]
    scripts: PathBuf,
    /// Optional output .json path to write; otherwise prints to stdout
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
struct EncodeArgs {
    /// JSON file holding an ObjectStates array
    input: PathBuf,
    /// Object directory to write into
    dir: PathBuf,
    /// Directory scripts are written to
    #[arg(long)]
    scripts: PathBuf,
    /// Scripts longer than this many characters get their own file
    #[arg(long, default_value_t = 80)]
    threshold: usize,
}

#[derive(ClapArgs, Debug)]
struct UnbundleArgs {
    /// Bundled .lua/.ttslua file
    path: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Cmd::Build(a) => cmd_build(a),
        Cmd::Unpack(a) => cmd_unpack(a),
        Cmd::ObjectsDecode(a) => cmd_objects_decode(a),
        Cmd::ObjectsEncode(a) => cmd_objects_encode(a),
        Cmd::Unbundle(a) => cmd_unbundle(a),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn fail(code: i32, e: impl std::fmt::Display) -> ! {
    eprintln!("error: {}", e);
    std::process::exit(code);
}

fn cmd_build(args: BuildArgs) {
    let save = ttsmod_core::build_mod(&args.mod_dir).unwrap_or_else(|e| fail(2, e));
    let out = args.out.unwrap_or_else(|| args.mod_dir.join("output.json"));
    ttsmod_core::write_mod_file(&out, &save).unwrap_or_else(|e| fail(5, e));
    println!("{}", out.display());
}

fn cmd_unpack(args: UnpackArgs) {
    let opts = WriteOptions {
        script_threshold: args.threshold,
    };
    let config = ttsmod_core::unpack_save(&args.save, &args.mod_dir, &opts, args.replace)
        .unwrap_or_else(|e| fail(2, e));
    println!("unpacked {} into {}", config.name, args.mod_dir.display());
}

fn cmd_objects_decode(args: DecodeArgs) {
    let store = FsScriptStore::new(&args.scripts);
    let objects =
        ttsmod_core::parse_all_object_states(&args.dir, &store).unwrap_or_else(|e| fail(2, e));
    let value = serde_json::Value::Array(objects);
    match args.out {
        Some(out) => ttsmod_core::write_json_file(&out, &value).unwrap_or_else(|e| fail(5, e)),
        None => match serde_json::to_string_pretty(&value) {
            Ok(s) => println!("{}", s),
            Err(e) => fail(5, e),
        },
    }
}

fn cmd_objects_encode(args: EncodeArgs) {
    let value: serde_json::Value =
        ttsmod_core::read_json_file(&args.input).unwrap_or_else(|e| fail(2, e));
    ensure_dir(&args.dir);
    let store = FsScriptStore::new(&args.scripts);
    let opts = WriteOptions {
        script_threshold: args.threshold,
    };
    ttsmod_core::print_object_states(&args.dir, &store, value, &opts)
        .unwrap_or_else(|e| fail(4, e));
}

fn cmd_unbundle(args: UnbundleArgs) {
    let text = std::fs::read_to_string(&args.path).unwrap_or_else(|e| fail(2, e));
    match ttsmod_core::unbundle(&text) {
        Ok(root) => println!("{}", root),
        Err(e) => fail(3, e),
    }
}

fn ensure_dir(dir: &Path) {
    if let Err(e) = std::fs::create_dir_all(dir) {
        fail(2, format!("creating {}: {}", dir.display(), e));
    }
}
