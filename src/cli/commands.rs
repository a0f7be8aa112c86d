//! Command handlers.

use serde_json::{Value, json};

use crate::registry::{Clusters, Galaxies};
use crate::store::FsStore;

use super::{Cli, Commands, ListArgs, RevertArgs, SearchArgs, ShowArgs, ValidateArgs};

pub fn run(cli: Cli) -> crate::Result<()> {
    let store = match &cli.data {
        Some(root) => FsStore::new(root),
        None => FsStore::bundled(),
    };
    match cli.command {
        Commands::List(ref args) => list(&cli, &store, args),
        Commands::Show(ref args) => show(&cli, &store, args),
        Commands::Search(ref args) => search(&cli, &store, args),
        Commands::Tags => tags(&cli, &store),
        Commands::Revert(ref args) => revert(&cli, &store, args),
        Commands::Validate(ref args) => validate(&store, args),
    }
}

fn list(cli: &Cli, store: &FsStore, args: &ListArgs) -> crate::Result<()> {
    let galaxy_types: Vec<String> = if args.clusters {
        Vec::new()
    } else {
        Galaxies::from_store(store)?
            .iter()
            .map(|(t, _)| t.to_string())
            .collect()
    };
    let cluster_types: Vec<String> = if args.galaxies {
        Vec::new()
    } else {
        Clusters::from_store(store, true)?
            .iter()
            .map(|(t, _)| t.to_string())
            .collect()
    };

    if cli.json {
        emit(&json!({"galaxies": galaxy_types, "clusters": cluster_types}));
        return Ok(());
    }
    if !galaxy_types.is_empty() {
        println!("galaxies:");
        for t in &galaxy_types {
            println!("  {t}");
        }
    }
    if !cluster_types.is_empty() {
        println!("clusters:");
        for t in &cluster_types {
            println!("  {t}");
        }
    }
    Ok(())
}

fn show(cli: &Cli, store: &FsStore, args: &ShowArgs) -> crate::Result<()> {
    let cluster = crate::Cluster::from_store(store, &args.cluster_type, true)?;
    if cli.json {
        emit(&cluster.to_value());
    } else {
        println!("{cluster}");
    }
    Ok(())
}

fn search(cli: &Cli, store: &FsStore, args: &SearchArgs) -> crate::Result<()> {
    let clusters = Clusters::from_store(store, true)?;
    if args.tags {
        let hits = clusters.search_tags(&args.query);
        if cli.json {
            let out: Vec<Value> = hits
                .iter()
                .map(|(c, tags)| json!({"type": c.cluster_type, "tags": tags}))
                .collect();
            emit(&Value::Array(out));
            return Ok(());
        }
        for (_, tags) in hits {
            for tag in tags {
                println!("{tag}");
            }
        }
        return Ok(());
    }

    let hits = clusters.search(&args.query);
    if cli.json {
        let out: Vec<Value> = hits
            .iter()
            .map(|(c, values)| {
                json!({
                    "type": c.cluster_type,
                    "matches": values.iter().map(|v| v.to_value()).collect::<Vec<_>>()
                })
            })
            .collect();
        emit(&Value::Array(out));
        return Ok(());
    }
    for (cluster, values) in hits {
        for value in values {
            println!("{}: {}", cluster.cluster_type, value.value);
        }
    }
    Ok(())
}

fn tags(cli: &Cli, store: &FsStore) -> crate::Result<()> {
    let clusters = Clusters::from_store(store, true)?;
    let all = clusters.all_machinetags();
    if cli.json {
        emit(&json!(all));
        return Ok(());
    }
    for tags in all {
        for tag in tags {
            println!("{tag}");
        }
    }
    Ok(())
}

fn revert(cli: &Cli, store: &FsStore, args: &RevertArgs) -> crate::Result<()> {
    let clusters = Clusters::from_store(store, true)?;
    let (cluster, value) = clusters.revert_machinetag(&args.machinetag)?;
    if cli.json {
        emit(&json!({"type": cluster.cluster_type, "value": value.to_value()}));
    } else {
        println!("{}", value.value);
        if let Some(description) = &value.description {
            println!("{description}");
        }
    }
    Ok(())
}

fn validate(store: &FsStore, args: &ValidateArgs) -> crate::Result<()> {
    if !args.clusters {
        Galaxies::from_store(store)?.validate_with_schema(store)?;
        println!("galaxies: ok");
    }
    if !args.galaxies {
        Clusters::from_store(store, true)?.validate_with_schema(store)?;
        println!("clusters: ok");
    }
    Ok(())
}

fn emit(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => tracing::error!("failed to render json output: {e}"),
    }
}
