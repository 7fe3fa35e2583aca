use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

mod output;

use examgen_core::config_file::load_config;
use examgen_core::generate::{GenerationOptions, generate_paper};
use examgen_core::pattern::extract_pattern;
use examgen_core::syllabus::parse_syllabus_with_fallback;
use examgen_core::{
    AnalysisReport, ClassifyEvent, Config, TextCompletion, allocate_questions, classify_frequency,
    compute_priority_scores,
};
use examgen_llm::GroqClient;
use examgen_pdf::{GarbleRules, OcrFallback, OcrService, extract_document_text};
use examgen_pdf_mupdf::MupdfBackend;
use examgen_render::{HeaderConfig, render_paper};
use output::ColorMode;

/// Exam Paper Generator - Analyze syllabi and previous-year questions,
/// then generate a fresh exam paper
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Path to the syllabus (PDF, or plain text with a .txt extension)
    #[arg(long)]
    syllabus: PathBuf,

    /// Path to a previous-year question paper PDF (repeatable)
    #[arg(long = "pyq", required = true)]
    pyq: Vec<PathBuf>,

    /// Path to a sample paper PDF used for pattern extraction
    #[arg(long)]
    sample: Option<PathBuf>,

    /// Groq API key (falls back to GROQ_API_KEY, then the config file)
    #[arg(long)]
    api_key: Option<String>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze inputs and print topic priorities and question allocation
    Analyze {
        #[command(flatten)]
        input: InputArgs,

        /// Emit the full analysis report as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Run the full pipeline and generate an exam paper
    Generate {
        #[command(flatten)]
        input: InputArgs,

        /// Total questions to allocate when no paper pattern is found
        #[arg(long)]
        total: Option<u32>,

        /// Write the paper as Markdown to this path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also render the paper to a PDF at this path
        #[arg(long)]
        pdf: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Analyze { input, json } => analyze(input, json).await,
        Command::Generate {
            input,
            total,
            output,
            pdf,
        } => generate(input, total, output, pdf).await,
    }
}

/// Resolve configuration: CLI flag > GROQ_API_KEY env > config file.
fn resolve_config(api_key: Option<String>) -> Config {
    let mut config = Config::default().apply_file(&load_config());
    if let Some(key) = api_key.or_else(|| std::env::var("GROQ_API_KEY").ok()) {
        config.api_key = Some(key);
    }
    config
}

async fn analyze(input: InputArgs, json: bool) -> anyhow::Result<()> {
    let config = resolve_config(input.api_key.clone());
    let color = ColorMode(!input.no_color);
    let report = run_analysis(&input, &config, color).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let mut stdout = std::io::stdout();
        output::print_analysis_summary(&mut stdout, &report, color)?;
    }
    Ok(())
}

async fn generate(
    input: InputArgs,
    total: Option<u32>,
    output_path: Option<PathBuf>,
    pdf_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut config = resolve_config(input.api_key.clone());
    if let Some(total) = total {
        config.total_questions = total;
    }
    let color = ColorMode(!input.no_color);
    let report = run_analysis(&input, &config, color).await?;

    let mut stdout = std::io::stdout();
    output::print_analysis_summary(&mut stdout, &report, color)?;

    let backend = client(&config)?;
    let options = GenerationOptions {
        model: config.generator_model.clone(),
        focus_topics: config.focus_topics,
        deadline: config
            .generation_deadline_secs
            .map(std::time::Duration::from_secs),
        fallback_questions: config.total_questions,
        ..Default::default()
    };

    let spinner = ProgressBar::new_spinner().with_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}").unwrap(),
    );
    spinner.set_message("Generating exam paper...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let paper = generate_paper(
        &report.priority_scores,
        &report.default_allocation,
        report.paper_pattern.as_ref(),
        &backend,
        &options,
    )
    .await;
    spinner.finish_and_clear();

    if !paper.has_content() {
        anyhow::bail!("generation produced no output");
    }

    let markdown = paper.to_markdown();
    match &output_path {
        Some(path) => {
            std::fs::write(path, &markdown)?;
            println!("Paper written to {}", path.display());
        }
        None if pdf_path.is_none() => println!("{markdown}"),
        None => {}
    }

    if let Some(path) = &pdf_path {
        let bytes = render_paper(&markdown, &HeaderConfig::default())?;
        std::fs::write(path, bytes)?;
        println!("PDF written to {}", path.display());
    }
    Ok(())
}

/// Extract inputs, parse the syllabus, classify PYQ fragments, score,
/// and allocate. The generate path reuses this wholesale.
async fn run_analysis(
    input: &InputArgs,
    config: &Config,
    color: ColorMode,
) -> anyhow::Result<AnalysisReport> {
    let backend = client(config)?;

    let syllabus_text = read_input(&input.syllabus, config).await?;
    let mut pyq_text = String::new();
    for path in &input.pyq {
        pyq_text.push_str(&read_input(path, config).await?);
        pyq_text.push('\n');
    }

    let syllabus = parse_syllabus_with_fallback(
        &syllabus_text,
        &config.syllabus_rules,
        Some(&backend as &dyn TextCompletion),
        &config.classifier_model,
    )
    .await;

    // With no topics there is nothing to classify against; generation
    // falls back to pattern-only or general prompting downstream.
    let no_modules_detected = syllabus.is_empty();
    if no_modules_detected {
        output::print_no_modules_warning(&mut std::io::stderr(), color)?;
    }

    let frequency = if no_modules_detected {
        Default::default()
    } else {
        let fragments = examgen_core::split_questions(&pyq_text, config.min_fragment_len);
        let bar = ProgressBar::new(fragments.len() as u64).with_style(
            ProgressStyle::with_template("{bar:30.cyan} {pos}/{len} classifying questions")
                .unwrap(),
        );
        let frequency = classify_frequency(
            &syllabus,
            &pyq_text,
            &backend,
            &config.classifier_model,
            config.min_fragment_len,
            |event| {
                if let ClassifyEvent::Matched { .. } | ClassifyEvent::Skipped { .. } = event {
                    bar.inc(1);
                }
            },
        )
        .await;
        bar.finish_and_clear();
        frequency
    };

    let priority_scores = compute_priority_scores(&syllabus, &frequency, &config.weights);
    let default_allocation = allocate_questions(
        &priority_scores,
        config.total_questions,
        config.min_allocation_score,
    );

    let paper_pattern = match &input.sample {
        Some(path) => {
            let sample_text = read_input(path, config).await?;
            extract_pattern(&sample_text, &backend, &config.generator_model).await
        }
        None => None,
    };

    Ok(AnalysisReport {
        syllabus_topics: syllabus,
        frequency,
        priority_scores,
        default_allocation,
        paper_pattern,
        no_modules_detected,
    })
}

fn client(config: &Config) -> anyhow::Result<GroqClient> {
    let key = config
        .api_key
        .clone()
        .ok_or_else(|| anyhow::anyhow!("no API key: pass --api-key or set GROQ_API_KEY"))?;
    let mut client = GroqClient::new(key);
    if let Some(model) = &config.vision_model {
        client = client.with_vision_model(model.clone());
    }
    Ok(client)
}

/// Read one input document: plain text files verbatim, PDFs through
/// the extraction stack with OCR fallback when a vision model is set.
async fn read_input(path: &Path, config: &Config) -> anyhow::Result<String> {
    if path.extension().and_then(|e| e.to_str()) == Some("txt") {
        return Ok(std::fs::read_to_string(path)?);
    }

    let backend = MupdfBackend::new();
    let rules = GarbleRules::default();

    let text = if let (Some(key), Some(_)) = (&config.api_key, &config.vision_model) {
        let mut ocr_client = GroqClient::new(key.clone());
        if let Some(model) = &config.vision_model {
            ocr_client = ocr_client.with_vision_model(model.clone());
        }
        let service = OcrService::with_engine(Box::new(ocr_client));
        extract_document_text(
            path,
            &backend,
            Some(OcrFallback {
                rasterizer: &backend,
                service: &service,
            }),
            &rules,
        )
        .await?
    } else {
        extract_document_text(path, &backend, None, &rules).await?
    };
    Ok(text)
}
