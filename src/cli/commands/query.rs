//! `tagdb query` command - Look up tags

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::output::{print_json, print_tags};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::cli::helpers::open_store;
use crate::core::{OrderColumn, Ordering, GLOBAL_SCOPE};

#[derive(Subcommand, Debug)]
pub enum QueryCommands {
    /// Tags by name (prefix match unless --exact)
    Name {
        name: String,

        /// Match the whole name
        #[arg(long, conflicts_with = "contains")]
        exact: bool,

        /// Match names containing the text anywhere
        #[arg(long)]
        contains: bool,

        /// Keep only tags whose parent is this
        #[arg(long)]
        parent: Option<String>,
    },

    /// Tags declared in one or more scopes, in scope order
    Scope {
        /// Scopes, e.g. `ns::Foo` or `<global>`
        #[arg(required = true)]
        scopes: Vec<String>,

        /// Name (prefix unless --exact)
        #[arg(long, short)]
        name: Option<String>,

        #[arg(long)]
        exact: bool,

        /// Kinds to keep (comma separated)
        #[arg(long, short, value_delimiter = ',')]
        kind: Vec<String>,
    },

    /// Tags of a file, ordered by line
    File {
        file: String,

        /// Only tags on this line
        #[arg(long)]
        line: Option<i64>,

        /// Kinds to keep (comma separated)
        #[arg(long, short, value_delimiter = ',')]
        kind: Vec<String>,

        /// Tags visible at file level whose name starts with this
        #[arg(long, conflicts_with_all = ["line", "kind"])]
        visible: Option<String>,
    },

    /// Tags of the given kinds
    Kind {
        #[arg(required = true, value_delimiter = ',')]
        kinds: Vec<String>,

        #[arg(long, value_enum)]
        order_by: Option<OrderColumn>,

        #[arg(long, requires = "order_by")]
        desc: bool,
    },

    /// Tags by fully qualified path
    Path {
        path: String,

        /// Kinds to keep (comma separated)
        #[arg(long, short, value_delimiter = ',')]
        kind: Vec<String>,

        /// Treat `::`-separated parts as substrings of the path
        #[arg(long)]
        parts: bool,
    },

    /// Innermost scope enclosing a line
    At { file: String, line: i64 },

    /// Resolve a possibly qualified type name seen from a scope
    Resolve {
        type_name: String,

        #[arg(long, short, default_value = GLOBAL_SCOPE)]
        scope: String,
    },

    /// Parameters of a function, in declaration order
    Params { function: String },

    /// Macro definition
    Macro { name: String },
}

pub fn run(cmd: QueryCommands, global: &GlobalOpts) -> Result<()> {
    let mut store = open_store(global)?;
    let format = global.format;

    match cmd {
        QueryCommands::Name {
            name,
            exact,
            contains,
            parent,
        } => {
            let tags = match parent {
                Some(parent) => store.tags_by_name_and_parent(&name, &parent),
                None if contains => store.tags_by_part_name(&name),
                None => store.tags_by_name(&name, exact),
            };
            print_tags(&tags, format)
        }
        QueryCommands::Scope {
            scopes,
            name,
            exact,
            kind,
        } => {
            let tags = match (name, scopes.as_slice()) {
                (Some(name), [scope]) if kind.is_empty() => {
                    store.tags_by_scope_and_name(scope, &name, !exact)
                }
                (Some(name), _) if kind.is_empty() => {
                    store.tags_by_scopes_and_name(&scopes, &name, !exact)
                }
                (Some(name), [scope]) => {
                    store.tags_by_scope_and_kind(scope, &kind, &name)
                }
                (None, [scope]) if kind.is_empty() => store.tags_by_scope(scope),
                (None, _) if kind.is_empty() => {
                    let mut tags = Vec::new();
                    for scope in &scopes {
                        tags.extend(store.tags_by_scope(scope));
                    }
                    tags.truncate(store.search_limit());
                    tags
                }
                (None, _) => store.tags_by_scopes_and_kind(&scopes, &kind),
                (Some(_), _) => {
                    return Err(miette::miette!(
                        "--name with --kind takes a single scope"
                    ))
                }
            };
            print_tags(&tags, format)
        }
        QueryCommands::File {
            file,
            line,
            kind,
            visible,
        } => {
            let tags = match (visible, line) {
                (Some(prefix), _) => store.file_scoped_tags(&file, &prefix, &[]),
                (None, Some(line)) => store.tags_by_file_and_line(&file, line),
                (None, None) if kind.is_empty() => store.tags_by_file(&file),
                (None, None) => store.tags_by_kind_and_file(
                    &kind,
                    &file,
                    Some(Ordering::asc(OrderColumn::Line)),
                ),
            };
            print_tags(&tags, format)
        }
        QueryCommands::Kind {
            kinds,
            order_by,
            desc,
        } => {
            let ordering = order_by.map(|column| {
                if desc {
                    Ordering::desc(column)
                } else {
                    Ordering::asc(column)
                }
            });
            let tags = store.tags_by_kind(&kinds, ordering);
            print_tags(&tags, format)
        }
        QueryCommands::Path { path, kind, parts } => {
            let tags = if parts {
                let parts: Vec<String> = path
                    .split("::")
                    .filter(|p| !p.is_empty())
                    .map(String::from)
                    .collect();
                store.tags_by_path_parts(&parts)
            } else if kind.is_empty() {
                store.tags_by_path(&[path])
            } else {
                let limit = store.search_limit();
                store.tags_by_path_and_kind(&path, &kind, limit)
            };
            print_tags(&tags, format)
        }
        QueryCommands::At { file, line } => {
            let tags: Vec<_> = store.scope_at(&file, line).into_iter().collect();
            print_tags(&tags, format)
        }
        QueryCommands::Resolve { type_name, scope } => {
            match store.resolve_type_scope(&type_name, &scope) {
                Some(resolved) if format == OutputFormat::Json => print_json(&resolved),
                Some(resolved) => {
                    println!("{}\t{}", resolved.name, resolved.scope);
                    Ok(())
                }
                None => Err(miette::miette!(
                    "Cannot resolve '{}' from scope '{}'",
                    type_name,
                    scope
                )),
            }
        }
        QueryCommands::Params { function } => {
            let tags = store.parameters(&function);
            print_tags(&tags, format)
        }
        QueryCommands::Macro { name } => match store.get_macro(&name) {
            Some(token) if format == OutputFormat::Json => print_json(&token),
            Some(token) => {
                let params = if token.is_function_like {
                    format!("({})", token.args.join(", "))
                } else {
                    String::new()
                };
                println!(
                    "{}{} {}",
                    style(&token.name).bold(),
                    params,
                    token.replacement
                );
                println!("{}", style(format!("line {}", token.line)).dim());
                Ok(())
            }
            None => Err(miette::miette!("Macro '{}' not found", name)),
        },
    }
}
