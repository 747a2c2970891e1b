use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use ugit::areas::repository::Repository;
use ugit::artifacts::core::{PagerWriter, should_page};
use ugit::commands::porcelain::log::LogOptions;

#[derive(Parser)]
#[command(
    name = "ugit",
    version = "0.1.0",
    about = "A minimal content-addressable version control system",
    long_about = "ugit stores snapshots of a directory as content-addressed objects, \
    tracks branches as references and merges diverging histories with a three-way merge.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        name = "init",
        about = "Initialize a new repository",
        long_about = "This command initializes a new repository in the current directory or at the specified path."
    )]
    Init {
        #[arg(index = 1, help = "The path to the repository")]
        path: Option<PathBuf>,
    },
    #[command(
        name = "hash-object",
        about = "Hash a file as a blob and optionally write it to the object database"
    )]
    HashObject {
        #[arg(short, long, help = "Write the object to the object database")]
        write: bool,
        #[arg(index = 1)]
        file: PathBuf,
    },
    #[command(
        name = "cat-file",
        about = "Print the content of an object",
        long_about = "This command prints a stored object, named by its id, an unambiguous id prefix or a revision."
    )]
    CatFile {
        #[arg(index = 1, help = "The object to print")]
        object: String,
    },
    #[command(name = "write-tree", about = "Create a tree object from the index")]
    WriteTree,
    #[command(
        name = "read-tree",
        about = "Load a tree into the index, or restore it onto a directory"
    )]
    ReadTree {
        #[arg(index = 1, help = "The tree, or a commit whose tree to read")]
        tree_ish: String,
        #[arg(
            long,
            value_name = "DIR",
            help = "Make DIR hold exactly the files of the tree"
        )]
        restore: Option<PathBuf>,
    },
    #[command(name = "ls-tree", about = "List the contents of a tree object")]
    LsTree {
        #[arg(short = 'r', help = "Recurse into sub-trees")]
        recursive: bool,
        #[arg(index = 1, default_value = "HEAD")]
        tree_ish: String,
    },
    #[command(
        name = "add",
        about = "Add file contents to the index",
        long_about = "This command stages the current content of the given files or directories."
    )]
    Add {
        #[arg(index = 1, required = true, help = "The files to stage")]
        paths: Vec<PathBuf>,
    },
    #[command(name = "rm", about = "Remove files from the index")]
    Rm {
        #[arg(
            long,
            required = true,
            help = "Only unstage; the working tree is left untouched"
        )]
        cached: bool,
        #[arg(index = 1, required = true)]
        paths: Vec<PathBuf>,
    },
    #[command(name = "status", about = "Show the working tree status")]
    Status {
        #[arg(long, short = 's', help = "Give the output in the short format")]
        porcelain: bool,
    },
    #[command(
        name = "commit",
        about = "Create a new commit with the specified message",
        long_about = "This command records the index as a new commit on the current branch."
    )]
    Commit {
        #[arg(short, long, default_value = "", help = "The commit message")]
        message: String,
    },
    #[command(name = "branch", about = "List, create, or delete branches")]
    Branch {
        #[arg(index = 1, help = "The name of the branch to create or delete")]
        name: Option<String>,
        #[arg(index = 2, help = "The revision the new branch starts at (HEAD by default)")]
        start: Option<String>,
        #[arg(short = 'd', long = "delete", requires = "name", help = "Delete the branch")]
        delete: bool,
    },
    #[command(
        name = "checkout",
        about = "Switch branches or detach HEAD at a commit",
        long_about = "This command switches to a branch, or detaches HEAD at any other revision."
    )]
    Checkout {
        #[arg(index = 1)]
        target: String,
        #[arg(short, long, help = "Discard local changes in the way")]
        force: bool,
    },
    #[command(name = "merge", about = "Join another branch into the current one")]
    Merge {
        #[arg(index = 1, required_unless_present = "abort")]
        target: Option<String>,
        #[arg(long, conflicts_with = "target", help = "Abort the merge in progress")]
        abort: bool,
    },
    #[command(name = "merge-base", about = "Find the best common ancestor of two commits")]
    MergeBase {
        #[arg(index = 1)]
        first: String,
        #[arg(index = 2)]
        second: String,
        #[arg(long, help = "Exit with 0 when the first commit is an ancestor of the second")]
        is_ancestor: bool,
    },
    #[command(name = "log", about = "Show the commit history")]
    Log {
        #[arg(index = 1, help = "Where to start the walk (HEAD by default)")]
        start: Option<String>,
        #[arg(long, help = "Show each commit on one line")]
        oneline: bool,
        #[arg(long, help = "Show abbreviated commit ids")]
        abbrev_commit: bool,
        #[arg(long, help = "Show the references pointing at each commit")]
        decorate: bool,
    },
}

fn current_dir() -> Result<PathBuf> {
    Ok(std::env::current_dir()?.canonicalize()?)
}

fn open_repository(pwd: &Path) -> Result<Repository> {
    Repository::discover(pwd, Box::new(std::io::stdout()))
}

fn absolute_paths(pwd: &Path, paths: &[PathBuf]) -> Vec<PathBuf> {
    paths.iter().map(|path| pwd.join(path)).collect()
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let pwd = current_dir()?;

    match cli.command {
        Commands::Init { path } => {
            let path = path.map_or(pwd.clone(), |path| pwd.join(path));
            Repository::new(&path, Box::new(std::io::stdout()))?.init()?;
        }
        Commands::HashObject { write, file } => {
            open_repository(&pwd)?.hash_object(&pwd.join(file), write)?;
        }
        Commands::CatFile { object } => {
            open_repository(&pwd)?.cat_file(&object)?;
        }
        Commands::WriteTree => {
            open_repository(&pwd)?.write_tree()?;
        }
        Commands::ReadTree { tree_ish, restore } => {
            let repository = open_repository(&pwd)?;
            let tree_oid = repository.resolve_tree(&tree_ish)?;
            match restore {
                Some(dest) => repository.restore_tree(&tree_oid, &pwd.join(dest))?,
                None => repository.read_tree(&tree_oid)?,
            }
        }
        Commands::LsTree {
            recursive,
            tree_ish,
        } => {
            open_repository(&pwd)?.ls_tree(&tree_ish, recursive)?;
        }
        Commands::Add { paths } => {
            open_repository(&pwd)?.stage(&absolute_paths(&pwd, &paths))?;
        }
        Commands::Rm { cached: _, paths } => {
            open_repository(&pwd)?.unstage(&absolute_paths(&pwd, &paths))?;
        }
        Commands::Status { porcelain } => {
            let repository = open_repository(&pwd)?;
            let status = repository.status()?;
            repository.print_status(&status, porcelain)?;
        }
        Commands::Commit { message } => {
            open_repository(&pwd)?.commit(&message)?;
        }
        Commands::Branch {
            name,
            start,
            delete,
        } => {
            let repository = open_repository(&pwd)?;
            match name {
                Some(name) if delete => {
                    repository.delete_branch(&name)?;
                }
                Some(name) => {
                    repository.branch(&name, start.as_deref())?;
                }
                None => repository.list_branches()?,
            }
        }
        Commands::Checkout { target, force } => {
            open_repository(&pwd)?.checkout(&target, force)?;
        }
        Commands::Merge { target, abort } => {
            let repository = open_repository(&pwd)?;
            match target {
                Some(target) if !abort => {
                    if repository.merge(&target)?.is_conflicted() {
                        std::process::exit(1);
                    }
                }
                _ => repository.abort_merge()?,
            }
        }
        Commands::MergeBase {
            first,
            second,
            is_ancestor,
        } => {
            let repository = open_repository(&pwd)?;
            let first = repository.resolve_object(&first)?;
            let second = repository.resolve_object(&second)?;

            if is_ancestor {
                if !repository.is_ancestor(&first, &second)? {
                    std::process::exit(1);
                }
            } else {
                match repository.merge_base(&first, &second)? {
                    Some(base) => println!("{base}"),
                    None => std::process::exit(1),
                }
            }
        }
        Commands::Log {
            start,
            oneline,
            abbrev_commit,
            decorate,
        } => {
            let options = LogOptions {
                oneline,
                abbrev_commit,
                decorate,
            };

            if should_page() {
                let writer = PagerWriter::new(minus::Pager::new());
                let pager = writer.pager().clone();
                let repository = Repository::discover(&pwd, Box::new(writer))?;
                repository.print_log(start.as_deref(), &options)?;
                minus::page_all(pager)?;
            } else {
                open_repository(&pwd)?.print_log(start.as_deref(), &options)?;
            }
        }
    }

    Ok(())
}
