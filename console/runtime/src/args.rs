use crate::{
    apply::{apply_route, Placement},
    core::{
        compile::compile_route,
        upstream_group::{assemble_failover, assemble_upstream_group},
        ResourceRef,
    },
    form,
    index::Catalog,
    output::OutputFormat,
    KubeCatalog,
};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[clap(name = "gloo-console", about = "Inspects and edits Gloo gateway routing")]
pub struct Args {
    #[clap(
        long,
        default_value = "gloo_console=info,warn",
        env = "GLOO_CONSOLE_LOG"
    )]
    log_level: kubert::LogFilter,

    #[clap(long, default_value = "plain")]
    log_format: kubert::LogFormat,

    #[clap(flatten)]
    client: kubert::ClientArgs,

    /// Route tables nested deeper than this are not expanded.
    #[clap(long, default_value = "10")]
    max_delegation_depth: usize,

    #[clap(long, short, value_enum, default_value = "plain")]
    output: OutputFormat,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Shows the effective routing tree of a virtual service.
    Routes { namespace: String, name: String },

    /// Shows the upstreams of an upstream group.
    UpstreamGroup {
        namespace: String,
        name: String,

        /// Fails if any upstream cannot be fetched.
        #[clap(long)]
        strict: bool,
    },

    /// Shows the upstreams of a failover scheme, by priority.
    Failover {
        namespace: String,
        name: String,

        /// Fails if any upstream cannot be fetched.
        #[clap(long)]
        strict: bool,
    },

    /// Compiles a route form and optionally writes it to its virtual service.
    CompileRoute {
        /// A JSON or YAML route form.
        file: PathBuf,

        /// Writes the route to the form's virtual service.
        #[clap(long)]
        apply: bool,

        /// Position of the route in the virtual service's route list. New
        /// routes go first by default.
        #[clap(long, requires = "apply")]
        index: Option<usize>,

        /// Replaces the route at `--index` instead of inserting before it.
        #[clap(long, requires = "apply")]
        replace: bool,
    },
}

impl Args {
    #[inline]
    pub async fn parse_and_run() -> Result<()> {
        Self::parse().run().await
    }

    pub async fn run(self) -> Result<()> {
        let Self {
            log_level,
            log_format,
            client,
            max_delegation_depth,
            output,
            command,
        } = self;

        log_format.try_init(log_level)?;
        let client = client.try_client().await?;
        let catalog = KubeCatalog::new(client.clone());

        let rendered = match command {
            Command::Routes { namespace, name } => {
                let vs = ResourceRef::new(namespace, name);
                let snapshot = Catalog::fetch(&catalog).await?;
                let nodes = snapshot.effective_routes(&vs, max_delegation_depth)?;
                output.routes(&vs, &nodes)?
            }

            Command::UpstreamGroup {
                namespace,
                name,
                strict,
            } => {
                let group = catalog
                    .upstream_group(&ResourceRef::new(namespace, name))
                    .await?;
                let mut table = assemble_upstream_group(&group, &catalog).await;
                if strict {
                    table = table.into_strict()?;
                }
                output.group_table(&table)?
            }

            Command::Failover {
                namespace,
                name,
                strict,
            } => {
                let scheme = catalog
                    .failover_scheme(&ResourceRef::new(namespace, name))
                    .await?;
                let mut levels = assemble_failover(&scheme, &catalog).await;
                if strict {
                    levels = levels
                        .into_iter()
                        .map(|table| table.into_strict())
                        .collect::<Result<_, _>>()?;
                }
                output.failover(&scheme, &levels)?
            }

            Command::CompileRoute {
                file,
                apply,
                index,
                replace,
            } => {
                let form = form::read(&file)?;
                let snapshot = Catalog::fetch(&catalog).await?;
                let route = match compile_route(&form, &snapshot.compile_context()) {
                    Ok(route) => route,
                    Err(errors) => {
                        print!("{}", output.validation_errors(&errors)?);
                        bail!("route form has {} validation errors", errors.len());
                    }
                };

                if apply {
                    let vs = form
                        .virtual_service
                        .as_ref()
                        .context("the route form does not name a virtual service")?;
                    let index = index.unwrap_or_default();
                    let placement = if replace {
                        Placement::Replace(index)
                    } else {
                        Placement::Insert(index)
                    };
                    apply_route(client, vs, &route, placement).await?;
                }
                output.route(&route)?
            }
        };

        print!("{rendered}");
        Ok(())
    }
}
