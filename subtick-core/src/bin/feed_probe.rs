// subtick-core/src/bin/feed_probe.rs

use anyhow::{Context, Result};
use subtick_core::filter::TextFilter;
use subtick_core::markup::{Directive, MarkupTokenizer, Token};
use subtick_io::{FeedEvent, FeedMonitor, ReconnectPolicy, TcpSource};

#[tokio::main]
async fn main() -> Result<()> {
    let address = std::env::args()
        .nth(1)
        .context("usage: feed_probe <host:port>")?;

    // Make sure *something* always prints even if tracing isn't set up elsewhere.
    eprintln!("[feed_probe] connecting to {address}… (Ctrl+C to exit)");

    let (monitor, mut rx) = FeedMonitor::start(TcpSource::new(), address, ReconnectPolicy::default());

    let mut filter = TextFilter::new();
    let mut tokenizer = MarkupTokenizer::new();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                eprintln!("\n[feed_probe] Ctrl+C received, exiting…");
                break;
            }

            event = rx.recv() => {
                let Some(event) = event else {
                    eprintln!("[feed_probe] feed task ended");
                    break;
                };

                match event {
                    FeedEvent::Connected(addr) => {
                        eprintln!("[feed_probe] connected to {addr}");
                        filter.reset();
                        tokenizer.reset();
                    }
                    FeedEvent::Data(bytes) => {
                        let text = filter.decode(&bytes);
                        for token in tokenizer.feed(&text) {
                            println!("{}", describe(&token));
                        }
                    }
                    FeedEvent::Disconnected(reason) => {
                        eprintln!("[feed_probe] disconnected: {reason}");
                    }
                    FeedEvent::GaveUp { attempts } => {
                        eprintln!("[feed_probe] gave up after {attempts} attempts");
                        break;
                    }
                }
            }
        }
    }

    if let Err(e) = monitor.stop().await {
        tracing::debug!("{e:#}");
    }
    Ok(())
}

fn describe(token: &Token) -> String {
    match token {
        Token::Word(word) => format!(
            "{} {:?}{}",
            word.color,
            word.text,
            if word.trailing_space { " ␠" } else { "" }
        ),
        Token::Directive(Directive::SetColor(color)) => format!("<color {color}>"),
        Token::Directive(Directive::Clear) => "<clear>".to_string(),
        Token::Directive(Directive::NewLine) => "<br>".to_string(),
        Token::Directive(Directive::Unrecognized) => "<ignored>".to_string(),
    }
}
