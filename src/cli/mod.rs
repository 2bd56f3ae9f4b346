//! CLI 모듈
//!
//! palank-agent CLI 명령어 정의 및 구현

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::agent::{Agent, ConversationTurn, RouterDecision};
use crate::config::{AgentConfig, ConfigOverrides};
use crate::knowledge::{DocumentStore, KeywordRetriever, LoaderConfig};
use crate::llm::OpenAiCompatibleGateway;

/// 트레이스에 표시할 스니펫 최대 길이
const SNIPPET_CHARS: usize = 200;

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "palank-agent")]
#[command(version, about = "미니 RAG 에이전트 - 검색할지 말지 스스로 결정", long_about = None)]
pub struct Cli {
    /// config.json 경로
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// 문서 폴더 (.txt 파일)
    #[arg(short, long, global = true)]
    pub docs: Option<PathBuf>,

    /// 모델 ID
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// 검색 결과 개수 (1 이상)
    #[arg(long, global = true, value_parser = parse_positive)]
    pub top_k: Option<usize>,

    /// 디버그 로그 출력
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// 대화형 모드 (기본값)
    Chat,

    /// 질문 하나에 답변
    Ask {
        /// 질문
        question: String,
    },

    /// 키워드 검색만 수행 (LLM 호출 없음)
    Search {
        /// 검색 쿼리
        query: String,

        /// 결과 개수 제한 (1 이상)
        #[arg(short, long, value_parser = parse_positive)]
        limit: Option<usize>,
    },

    /// 상태 확인
    Status,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            config_path: self.config.clone(),
            docs_dir: self.docs.clone(),
            model: self.model.clone(),
            top_k: self.top_k,
        }
    }
}

// ============================================================================
// CLI Runner
// ============================================================================

/// CLI 명령어 실행
pub async fn run(cli: Cli) -> Result<()> {
    let config = AgentConfig::load(&cli.overrides()).context("설정 로딩 실패")?;

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => cmd_chat(&config).await,
        Commands::Ask { question } => cmd_ask(&config, &question).await,
        Commands::Search { query, limit } => cmd_search(&config, &query, limit),
        Commands::Status => cmd_status(&config),
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

/// 대화형 모드 (chat)
///
/// `exit` / `quit` 또는 입력 종료(EOF)까지 질문을 받습니다.
async fn cmd_chat(config: &AgentConfig) -> Result<()> {
    let agent = build_agent(config)?;

    println!("[OK] {} 청크 로딩됨 ({})", agent.store().len(), config.docs_dir.display());
    println!("미니 에이전트: 질문을 입력하세요. 종료하려면 'exit'.\n");

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    repl(&agent, stdin, &mut stdout).await
}

/// 질문 하나 처리 (ask)
async fn cmd_ask(config: &AgentConfig, question: &str) -> Result<()> {
    let agent = build_agent(config)?;

    let turn = agent.run_turn(question).await.context("질문 처리 실패")?;
    let mut stdout = std::io::stdout();
    print_turn(&mut stdout, &turn)?;
    Ok(())
}

/// 검색 명령어 (search)
///
/// 라우터/답변기 없이 키워드 검색 결과만 보여줍니다.
fn cmd_search(config: &AgentConfig, query: &str, limit: Option<usize>) -> Result<()> {
    let store = load_store(config)?;
    let retriever = KeywordRetriever::new(limit.unwrap_or(config.top_k));

    println!("[*] 검색 중: \"{}\"", query);

    let results = retriever.search(store.chunks(), query);

    if results.is_empty() {
        println!("\n[!] 검색 결과가 없습니다.");
        return Ok(());
    }

    println!("\n[OK] 검색 결과 ({} 건):\n", results.len());

    for (i, result) in results.iter().enumerate() {
        println!(
            "{}. [점수: {}] {} #{}",
            i + 1,
            result.score,
            result.source(),
            result.chunk.index()
        );
        println!("   내용: {}", truncate_text(result.text(), SNIPPET_CHARS));
        println!();
    }

    Ok(())
}

/// 상태 명령어 (status)
fn cmd_status(config: &AgentConfig) -> Result<()> {
    println!("palank-agent v{}", env!("CARGO_PKG_VERSION"));
    println!();

    match config.source_path {
        Some(ref path) => println!("[*] 설정 파일: {}", path.display()),
        None => println!("[*] 설정 파일: 없음 (환경변수/기본값 사용)"),
    }

    if config.has_api_key() {
        println!("[OK] API 키: 설정됨");
    } else {
        println!("[!] API 키: 미설정");
        println!("    설정: config.json의 api_key 또는 export OPENAI_API_KEY=your-key");
    }

    println!("[*] 엔드포인트: {}", config.base_url);
    println!("[*] 모델: {}", config.model);
    println!("[*] 검색 결과 개수: {}", config.top_k);
    println!("[*] 문서 폴더: {}", config.docs_dir.display());

    match load_store(config) {
        Ok(store) => {
            let stats = store.stats();
            println!("[OK] 문서: {} 건, 청크: {} 개", stats.document_count, stats.chunk_count);
            println!(
                "     총 콘텐츠: {}",
                format_bytes(stats.total_content_bytes)
            );
        }
        Err(e) => {
            println!("[!] 문서 로딩 실패: {:#}", e);
        }
    }

    Ok(())
}

// ============================================================================
// REPL
// ============================================================================

/// 입력 스트림에서 질문을 읽어 처리
///
/// 한 턴이 실패해도 진단 메시지만 출력하고 다음 질문을 받습니다.
/// UTF-8이 아닌 입력은 손실 변환(U+FFFD)해서 그대로 처리합니다.
pub async fn repl<R, W>(agent: &Agent, mut input: R, out: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut buf = Vec::new();

    loop {
        write!(out, "You: ")?;
        out.flush()?;

        buf.clear();
        if input.read_until(b'\n', &mut buf).await? == 0 {
            writeln!(out)?;
            break;
        }

        let line = String::from_utf8_lossy(&buf);
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if is_exit_command(question) {
            break;
        }

        match agent.run_turn(question).await {
            Ok(turn) => print_turn(out, &turn)?,
            Err(e) => {
                tracing::error!("Turn failed: {}", e);
                writeln!(out, "\n[!] ERROR: {}\n", e)?;
            }
        }
    }

    Ok(())
}

/// 트레이스 + 최종 답변 출력
fn print_turn<W: Write>(out: &mut W, turn: &ConversationTurn<'_>) -> Result<()> {
    for line in render_trace(turn) {
        writeln!(out, "{}", line)?;
    }
    writeln!(out, "\nAgent: {}\n", turn.answer)?;
    Ok(())
}

/// 디버깅용 트레이스: 라우터 결정 → (검색 호출, 결과별 source/score/snippet)
pub fn render_trace(turn: &ConversationTurn<'_>) -> Vec<String> {
    let mut lines = vec![format!("[router decision] {}", turn.decision.to_json())];

    if let RouterDecision::SearchDocs { ref query } = turn.decision {
        lines.push(format!("[tool call] search_docs(query={:?})", query));

        if turn.matches.is_empty() {
            lines.push(format!("[tool result] {}", crate::agent::NO_RESULTS));
        }
        for m in &turn.matches {
            lines.push(format!(
                "[tool result] [source={} score={}] {}",
                m.source(),
                m.score,
                truncate_text(m.text(), SNIPPET_CHARS)
            ));
        }
    }

    lines
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 문서 저장소 로딩
fn load_store(config: &AgentConfig) -> Result<Arc<DocumentStore>> {
    let loader = LoaderConfig::with_max_chunk_chars(config.max_chunk_chars);
    let store = DocumentStore::load(&config.docs_dir, &loader)
        .with_context(|| format!("문서 폴더 로딩 실패: {}", config.docs_dir.display()))?;
    Ok(Arc::new(store))
}

/// 에이전트 구성 (설정 + 문서 + 게이트웨이)
fn build_agent(config: &AgentConfig) -> Result<Agent> {
    let store = load_store(config)?;
    let gateway =
        OpenAiCompatibleGateway::from_config(config).context("LLM 게이트웨이 생성 실패")?;

    tracing::info!(
        "Agent ready: model={}, base_url={}, chunks={}",
        config.model,
        config.base_url,
        store.len()
    );

    Ok(Agent::new(store, Arc::new(gateway), config.top_k))
}

/// 1 이상의 정수 인자
fn parse_positive(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

/// 종료 명령어 여부
fn is_exit_command(input: &str) -> bool {
    input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit")
}

/// 텍스트 자르기 (UTF-8 안전)
fn truncate_text(text: &str, max_chars: usize) -> String {
    let cleaned = text.replace('\n', " ").replace('\r', "");
    let cleaned = cleaned.trim();

    if cleaned.chars().count() <= max_chars {
        cleaned.to_string()
    } else {
        let truncated: String = cleaned.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

/// 바이트 크기 포맷팅
fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::{DocumentChunk, RetrievedMatch};
    use crate::test_support::{FailingGateway, ScriptedGateway};

    fn journal_agent(gateway: Arc<dyn crate::llm::LlmGateway>) -> Agent {
        let store = Arc::new(DocumentStore::from_chunks(vec![DocumentChunk::new(
            "travel_journal.txt",
            "In September I visited Helsinki.",
            0,
        )]));
        Agent::new(store, gateway, 3)
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("hello", 10), "hello");
        assert_eq!(truncate_text("hello world", 5), "hello...");
        assert_eq!(truncate_text("hello\nworld", 20), "hello world");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(500), "500 B");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(1048576), "1.00 MB");
    }

    #[test]
    fn test_truncate_unicode() {
        let korean = "안녕하세요 세계";
        let truncated = truncate_text(korean, 5);
        assert_eq!(truncated, "안녕하세요...");
    }

    #[test]
    fn test_exit_commands() {
        assert!(is_exit_command("exit"));
        assert!(is_exit_command("QUIT"));
        assert!(!is_exit_command("exit now"));
    }

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["palank-agent", "--docs", "notes", "ask", "Where?"]).unwrap();
        assert_eq!(cli.docs, Some(PathBuf::from("notes")));
        assert_eq!(
            cli.command,
            Some(Commands::Ask {
                question: "Where?".to_string()
            })
        );

        let cli = Cli::try_parse_from(["palank-agent"]).unwrap();
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["palank-agent", "search", "helsinki", "-l", "2"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Search {
                query: "helsinki".to_string(),
                limit: Some(2)
            })
        );
    }

    #[test]
    fn test_cli_rejects_zero_counts() {
        assert!(Cli::try_parse_from(["palank-agent", "--top-k", "0", "ask", "q"]).is_err());
        assert!(Cli::try_parse_from(["palank-agent", "search", "q", "--limit", "0"]).is_err());

        let cli = Cli::try_parse_from(["palank-agent", "--top-k", "2", "ask", "q"]).unwrap();
        assert_eq!(cli.top_k, Some(2));
    }

    #[test]
    fn test_render_trace_shapes() {
        let chunk = DocumentChunk::new("travel_journal.txt", "In September\nI visited Helsinki.", 0);

        let direct = ConversationTurn {
            question: "q".to_string(),
            decision: RouterDecision::NoSearch,
            matches: vec![],
            answer: "a".to_string(),
        };
        assert_eq!(
            render_trace(&direct),
            vec![r#"[router decision] {"action":"NO_SEARCH"}"#.to_string()]
        );

        let grounded = ConversationTurn {
            question: "q".to_string(),
            decision: RouterDecision::SearchDocs {
                query: "Helsinki".to_string(),
            },
            matches: vec![RetrievedMatch {
                chunk: &chunk,
                score: 1,
            }],
            answer: "a".to_string(),
        };
        assert_eq!(
            render_trace(&grounded),
            vec![
                r#"[router decision] {"action":"SEARCH_DOCS","query":"Helsinki"}"#.to_string(),
                r#"[tool call] search_docs(query="Helsinki")"#.to_string(),
                "[tool result] [source=travel_journal.txt score=1] In September I visited Helsinki."
                    .to_string(),
            ]
        );

        let empty = ConversationTurn {
            matches: vec![],
            ..grounded.clone()
        };
        assert_eq!(render_trace(&empty)[2], "[tool result] NO_RESULTS");
    }

    #[tokio::test]
    async fn test_repl_answers_until_exit() {
        let gateway = Arc::new(ScriptedGateway::new(
            r#"{"action":"SEARCH_DOCS","query":"Helsinki"}"#,
            "September (travel_journal.txt).",
        ));
        let agent = journal_agent(gateway.clone());

        let input: &[u8] = b"\nWhen did I visit Helsinki?\nexit\nnever asked\n";
        let mut out = Vec::new();
        repl(&agent, input, &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        let decision_pos = text.find("[router decision]").unwrap();
        let result_pos = text.find("[tool result] [source=travel_journal.txt").unwrap();
        let answer_pos = text.find("Agent: September (travel_journal.txt).").unwrap();
        assert!(decision_pos < result_pos && result_pos < answer_pos);

        // 빈 줄은 무시, exit 이후 입력은 처리 안 함
        assert_eq!(gateway.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_repl_keeps_going_after_invalid_utf8_line() {
        let gateway = Arc::new(ScriptedGateway::new(r#"{"action":"NO_SEARCH"}"#, "ok"));
        let agent = journal_agent(gateway.clone());

        let input: &[u8] = b"caf\xe9?\nsecond question\n";
        let mut out = Vec::new();
        repl(&agent, input, &mut out).await.unwrap();

        let calls = gateway.calls();
        // 질문당 라우터 + 답변기
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[0].messages[1].content, "caf\u{FFFD}?");
        assert_eq!(calls[2].messages[1].content, "second question");
        assert_eq!(String::from_utf8(out).unwrap().matches("Agent: ok").count(), 2);
    }

    #[tokio::test]
    async fn test_repl_survives_failed_turn_and_stops_at_eof() {
        let agent = journal_agent(Arc::new(FailingGateway));

        let input: &[u8] = b"first\nsecond";
        let mut out = Vec::new();
        repl(&agent, input, &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("[!] ERROR:").count(), 2);
        assert!(!text.contains("Agent:"));
    }
}
