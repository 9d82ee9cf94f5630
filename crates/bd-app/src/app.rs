//! Interactive terminal front end

use std::sync::Arc;

use anyhow::{Context, Result};
use bd_core::{Coordinator, CoordinatorSettings, FetchRequest};
use bd_data::{DataAccess, ViewKind};
use bd_render::TextBackend;
use bd_views::{AnnotationView, ExplorerView, InsightsView};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

use crate::commands::{Command, HELP};

/// The terminal application: a coordinator plus one view model per tab
pub struct App {
    coordinator: Coordinator,
    backend: Arc<TextBackend>,
    insights: InsightsView,
    explorer: ExplorerView,
    annotation: AnnotationView,
}

impl App {
    pub fn new(access: Arc<dyn DataAccess>, settings: CoordinatorSettings) -> Self {
        let backend = Arc::new(TextBackend::new());
        Self {
            coordinator: Coordinator::new(access, settings),
            insights: InsightsView::new(backend.clone()),
            explorer: ExplorerView::default(),
            annotation: AnnotationView::new(),
            backend,
        }
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    /// Read commands from stdin until `quit` or end of input
    pub async fn run(&mut self) -> Result<()> {
        match self.coordinator.refresh_sources().await {
            Ok(_) => println!("{}", self.list()),
            Err(e) => error!("Could not list files: {}", e),
        }
        println!("Type 'help' for commands.");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await.context("Failed to read input")? {
            if line.trim().is_empty() {
                continue;
            }

            let command = match line.parse::<Command>() {
                Ok(command) => command,
                Err(e) => {
                    println!("{}", e);
                    continue;
                }
            };
            if command == Command::Quit {
                break;
            }

            match self.execute(command).await {
                Ok(output) => println!("{}", output),
                Err(e) => println!("Error: {:#}", e),
            }
        }

        self.insights.teardown();
        info!("Bye");
        Ok(())
    }

    /// Run one command and return the text to print
    pub async fn execute(&mut self, command: Command) -> Result<String> {
        let output = self.apply(command).await;
        // Commands can change the selection even when they fail part way
        self.sync_views()?;
        match output? {
            Some(text) => Ok(text),
            None => Ok(self.render()),
        }
    }

    /// Apply a command; `None` means the active view should be rendered
    async fn apply(&mut self, command: Command) -> Result<Option<String>> {
        let requests: Vec<FetchRequest> = match command {
            Command::List => {
                self.coordinator.refresh_sources().await?;
                return Ok(Some(self.list()));
            }
            Command::Help => return Ok(Some(HELP.to_string())),
            Command::Quit | Command::Show => Vec::new(),
            Command::Select(id) => self.coordinator.select(&id)?,
            Command::Tab(view) => self.coordinator.activate_view(view),
            Command::Next => self.coordinator.go_to_next_page(),
            Command::Prev => self.coordinator.go_to_previous_page(),
            Command::Size(size) => self.coordinator.set_page_size(size)?,
            Command::Column(column) => {
                self.insights.choose_column(column.clone());
                self.annotation.choose_column(column);
                Vec::new()
            }
            Command::Ask(column) => {
                if let Some(column) = column {
                    self.annotation.choose_column(column);
                }
                self.annotation.submit(&mut self.coordinator)?
            }
            Command::Upload(path) => {
                let contents = tokio::fs::read(&path)
                    .await
                    .with_context(|| format!("Failed to read {:?}", path))?;
                let filename = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                let source = self.coordinator.upload(&filename, contents).await?;
                return Ok(Some(format!(
                    "Uploaded {} as {}\n{}",
                    filename,
                    source.id,
                    self.list()
                )));
            }
            Command::Delete(id) => {
                self.coordinator.delete_source(&id).await?;
                return Ok(Some(format!("Deleted {}\n{}", id, self.list())));
            }
        };

        self.coordinator.run(requests).await;
        Ok(None)
    }

    /// Bring the view models in line with the coordinator.
    ///
    /// Charts only exist while the insights tab is active.
    fn sync_views(&mut self) -> Result<()> {
        if self.coordinator.active_view() == ViewKind::Insights {
            self.insights.sync(&self.coordinator)?;
        } else {
            self.insights.teardown();
        }
        self.annotation.sync(&self.coordinator);
        Ok(())
    }

    /// Listing of the known files
    pub fn list(&self) -> String {
        let sources = self.coordinator.sources();
        if sources.is_empty() {
            return "No files uploaded yet".to_string();
        }

        let selected = self.coordinator.selected().map(|source| &source.id);
        sources
            .iter()
            .map(|source| {
                let marker = if Some(&source.id) == selected { '*' } else { ' ' };
                format!("{} {}  {}", marker, source.id, source.filename)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Render the tab bar and the active view, as of the last sync
    pub fn render(&self) -> String {
        let active = self.coordinator.active_view();
        let tabs = ViewKind::ALL
            .iter()
            .map(|view| {
                if *view == active {
                    format!("[{}]", view)
                } else {
                    view.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ");
        let title = self
            .coordinator
            .selected()
            .map(|source| source.filename.clone())
            .unwrap_or_else(|| "no file selected".to_string());

        let body = match active {
            ViewKind::Explorer => self.explorer.render(&self.coordinator),
            ViewKind::Insights => self.render_insights(),
            ViewKind::Annotation => self.annotation.render(&self.coordinator),
        };

        format!("{} | {}\n{}", title, tabs, body)
    }

    fn render_insights(&self) -> String {
        if let Some(message) = self.insights.status(&self.coordinator) {
            return message;
        }

        let charts: Vec<String> = [self.insights.pie_artifact(), self.insights.bar_artifact()]
            .into_iter()
            .flatten()
            .filter_map(|artifact| self.backend.output(artifact))
            .collect();
        if charts.is_empty() {
            return "No metadata columns to chart".to_string();
        }
        charts.join("\n")
    }
}
