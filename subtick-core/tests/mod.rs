use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use subtick_core::filter::TextFilter;
use subtick_core::layout::{
    Geometry, LayoutEngine, Line, Monospace, Placement, Run, RunTarget, ScrollBuffer,
};
use subtick_core::markup::{Directive, MarkupTokenizer, Token, Word, interpret};
use subtick_core::render::{Frame, NullSink, RecordingSink, RenderSink};
use subtick_core::{Rgb, Ticker, TickerEngine, TickerSettings};
use subtick_io::{ByteSource, FeedError, FeedEvent, ReconnectPolicy};
use tokio::sync::mpsc;

fn word(text: &str, color: Rgb, trailing_space: bool) -> Token {
    Token::Word(Word {
        text: text.to_string(),
        color,
        trailing_space,
    })
}

fn cells_layout(cols: u16, rows: u16) -> LayoutEngine<Monospace> {
    LayoutEngine::new(Geometry::cells(cols, rows), Monospace::CELL)
}

fn line_texts(layout: &LayoutEngine<Monospace>) -> Vec<String> {
    layout.buffer().iter().map(Line::text).collect()
}

fn unpaced() -> TickerSettings {
    TickerSettings {
        pacing: Duration::ZERO,
        ..TickerSettings::default()
    }
}

// ============================================================================
// Rgb Tests
// ============================================================================

#[test]
fn test_rgb_channels() {
    let c = Rgb::new(0x12AB34);
    assert_eq!((c.r(), c.g(), c.b()), (0x12, 0xAB, 0x34));
    assert_eq!(Rgb::from_channels(0x12, 0xAB, 0x34), c);
}

#[test]
fn test_rgb_masks_to_24_bits() {
    assert_eq!(Rgb::new(0xFF12_3456).value(), 0x12_3456);
}

#[test]
fn test_rgb_display() {
    assert_eq!(Rgb::RED.to_string(), "#FF0000");
    assert_eq!(Rgb::new(0xa).to_string(), "#00000A");
}

#[test]
fn test_rgb_parse_hex() {
    assert_eq!(Rgb::parse_hex("00ff00"), Some(Rgb::GREEN));
    assert_eq!(Rgb::parse_hex("F"), Some(Rgb::new(0xF)));
    assert_eq!(Rgb::parse_hex(""), None);
    assert_eq!(Rgb::parse_hex("1234567"), None);
    assert_eq!(Rgb::parse_hex("+12345"), None);
    assert_eq!(Rgb::parse_hex("GG0000"), None);
    assert_eq!(Rgb::parse_hex(" FF000"), None);
}

#[test]
fn test_rgb_from_str() {
    assert_eq!("#FFFF00".parse::<Rgb>(), Ok(Rgb::YELLOW));
    assert_eq!("ffffff".parse::<Rgb>(), Ok(Rgb::WHITE));
    let err = "#nope".parse::<Rgb>().unwrap_err();
    assert!(err.to_string().contains("#nope"));
}

// ============================================================================
// TextFilter Tests
// ============================================================================

#[test]
fn test_filter_passes_printable_ascii() {
    let mut f = TextFilter::new();
    assert_eq!(f.decode(b"Hello <br/> world!"), "Hello <br/> world!");
}

#[test]
fn test_filter_drops_high_bytes() {
    let mut f = TextFilter::new();
    assert_eq!(f.decode("caf\u{e9} \u{2019}ok".as_bytes()), "caf ok");
    assert_eq!(f.decode(&[b'a', 0x80, 0xFF, b'b']), "ab");
}

#[test]
fn test_filter_drops_controls_and_expands_tabs() {
    let mut f = TextFilter::new();
    assert_eq!(f.decode(b"a\x00b\x07c\x1bd\x7fe\tf"), "abcde f");
}

#[test]
fn test_filter_normalizes_line_endings() {
    let mut f = TextFilter::new();
    assert_eq!(f.decode(b"one\r\ntwo\rthree\nfour"), "one\ntwo\nthree\nfour");
}

#[test]
fn test_filter_crlf_split_across_reads() {
    let mut f = TextFilter::new();
    assert_eq!(f.decode(b"one\r"), "one\n");
    assert_eq!(f.decode(b"\ntwo"), "two");
}

#[test]
fn test_filter_reset_forgets_cr() {
    let mut f = TextFilter::new();
    f.decode(b"x\r");
    f.reset();
    assert_eq!(f.decode(b"\n"), "\n");
}

// ============================================================================
// Directive Tests
// ============================================================================

#[test]
fn test_interpret_clear_and_break() {
    assert_eq!(interpret("<clear/>"), Directive::Clear);
    assert_eq!(interpret("<CLEAR/>"), Directive::Clear);
    assert_eq!(interpret("<br/>"), Directive::NewLine);
    assert_eq!(interpret("<Br/>"), Directive::NewLine);
}

#[test]
fn test_interpret_font_color() {
    assert_eq!(
        interpret("<font color=\"#00FF00\">"),
        Directive::SetColor(Rgb::GREEN)
    );
    assert_eq!(
        interpret("<FONT COLOR=\"#ffff00\"/>"),
        Directive::SetColor(Rgb::YELLOW)
    );
}

#[test]
fn test_interpret_malformed_color_is_unrecognized() {
    assert_eq!(interpret("<font color=\"#XYZ\"/>"), Directive::Unrecognized);
    assert_eq!(interpret("<font color=\"#00FF00/>"), Directive::Unrecognized);
    assert_eq!(interpret("<font color=\"#\"/>"), Directive::Unrecognized);
    assert_eq!(interpret("<font color=\"#1234567\"/>"), Directive::Unrecognized);
    assert_eq!(interpret("<font color=red/>"), Directive::Unrecognized);
}

#[test]
fn test_interpret_unknown() {
    assert_eq!(interpret("</font>"), Directive::Unrecognized);
    assert_eq!(interpret("<b/>"), Directive::Unrecognized);
    assert_eq!(interpret("<clear />"), Directive::Unrecognized);
    assert_eq!(interpret(""), Directive::Unrecognized);
    assert_eq!(interpret("<"), Directive::Unrecognized);
}

// ============================================================================
// MarkupTokenizer Tests
// ============================================================================

#[test]
fn test_tokenizer_plain_words() {
    let mut t = MarkupTokenizer::new();
    assert_eq!(
        t.feed("Hello big world"),
        vec![
            word("Hello", Rgb::RED, true),
            word("big", Rgb::RED, true),
            word("world", Rgb::RED, false),
        ]
    );
}

#[test]
fn test_tokenizer_hyphen_stays_on_word() {
    let mut t = MarkupTokenizer::new();
    assert_eq!(
        t.feed("well-known fact"),
        vec![
            word("well-", Rgb::RED, false),
            word("known", Rgb::RED, true),
            word("fact", Rgb::RED, false),
        ]
    );
}

#[test]
fn test_tokenizer_newlines_end_words_with_space() {
    let mut t = MarkupTokenizer::new();
    assert_eq!(
        t.feed("a\nb\r"),
        vec![word("a", Rgb::RED, true), word("b", Rgb::RED, true)]
    );
}

#[test]
fn test_tokenizer_double_space_yields_empty_spaced_word() {
    let mut t = MarkupTokenizer::new();
    assert_eq!(
        t.feed("a  b"),
        vec![
            word("a", Rgb::RED, true),
            word("", Rgb::RED, true),
            word("b", Rgb::RED, false),
        ]
    );
}

#[test]
fn test_tokenizer_color_directive() {
    let mut t = MarkupTokenizer::new();
    let tokens = t.feed("Hello <font color=\"#00FF00\"/>World<br/>");
    assert_eq!(
        tokens,
        vec![
            word("Hello", Rgb::RED, true),
            Token::Directive(Directive::SetColor(Rgb::GREEN)),
            word("World", Rgb::GREEN, false),
            Token::Directive(Directive::NewLine),
        ]
    );
    assert_eq!(t.color(), Rgb::GREEN);
    assert!(!t.in_markup());
}

#[test]
fn test_tokenizer_directive_flushes_word_without_space() {
    let mut t = MarkupTokenizer::new();
    assert_eq!(
        t.feed("ab<clear/>cd"),
        vec![
            word("ab", Rgb::RED, false),
            Token::Directive(Directive::Clear),
            word("cd", Rgb::RED, false),
        ]
    );
}

#[test]
fn test_tokenizer_partial_word_flushed_at_chunk_end() {
    let mut t = MarkupTokenizer::new();
    assert_eq!(t.feed("Hel"), vec![word("Hel", Rgb::RED, false)]);
    assert_eq!(t.feed("lo "), vec![word("lo", Rgb::RED, true)]);
}

#[test]
fn test_tokenizer_directive_split_across_chunks() {
    let mut t = MarkupTokenizer::new();
    assert_eq!(t.feed("News <font col"), vec![word("News", Rgb::RED, true)]);
    assert!(t.in_markup());
    assert_eq!(t.pending(), "<font col");

    assert!(t.feed("or=\"#FFFF00\"/").is_empty());
    assert_eq!(t.pending(), "<font color=\"#FFFF00\"/");

    assert_eq!(
        t.feed(">at ten"),
        vec![
            Token::Directive(Directive::SetColor(Rgb::YELLOW)),
            word("at", Rgb::YELLOW, true),
            word("ten", Rgb::YELLOW, false),
        ]
    );
    assert_eq!(t.pending(), "");
}

#[test]
fn test_tokenizer_every_split_point_of_a_directive() {
    let input = "x<br/>y";
    for split in 0..=input.len() {
        let mut t = MarkupTokenizer::new();
        let mut tokens = t.feed(&input[..split]);
        tokens.extend(t.feed(&input[split..]));
        let directives: Vec<_> = tokens
            .iter()
            .filter(|tok| matches!(tok, Token::Directive(_)))
            .collect();
        assert_eq!(
            directives,
            vec![&Token::Directive(Directive::NewLine)],
            "split at {split}"
        );
    }
}

#[test]
fn test_tokenizer_close_sequence_split_over_three_chunks() {
    let mut t = MarkupTokenizer::new();
    assert!(t.feed("<font color=\"#00FF00\"").is_empty());
    assert!(t.feed("/").is_empty());
    assert_eq!(
        t.feed(">x"),
        vec![
            Token::Directive(Directive::SetColor(Rgb::GREEN)),
            word("x", Rgb::GREEN, false),
        ]
    );
}

#[test]
fn test_tokenizer_carried_slash_without_gt() {
    let mut t = MarkupTokenizer::new();
    assert!(t.feed("<a/").is_empty());
    assert_eq!(
        t.feed("b/>ok"),
        vec![
            Token::Directive(Directive::Unrecognized),
            word("ok", Rgb::RED, false),
        ]
    );
}

#[test]
fn test_tokenizer_long_directive_in_tiny_chunks() {
    let mut t = MarkupTokenizer::new();
    assert!(t.feed("<font color=\"#FFFF00\" ").is_empty());
    for _ in 0..20_000 {
        assert!(t.feed("pad/").is_empty());
    }
    assert_eq!(t.pending().len(), 22 + 20_000 * 4);

    let tokens = t.feed(">done");
    assert_eq!(
        tokens,
        vec![
            Token::Directive(Directive::SetColor(Rgb::YELLOW)),
            word("done", Rgb::YELLOW, false),
        ]
    );
    assert_eq!(t.pending(), "");
}

#[test]
fn test_tokenizer_unterminated_directive_stalls() {
    let mut t = MarkupTokenizer::new();
    assert_eq!(t.feed("before <font color=\"#00FF00\">"), vec![word("before", Rgb::RED, true)]);
    assert!(t.feed("held back text ").is_empty());
    assert!(t.feed("</font> more").is_empty());
    assert!(t.in_markup());
}

#[test]
fn test_tokenizer_any_slash_gt_closes_markup() {
    // The close sequence is not tied to the tag that opened it.
    let mut t = MarkupTokenizer::new();
    let tokens = t.feed("<font color=\"#00FF00\">see a/b and/> after");
    assert_eq!(
        tokens,
        vec![
            Token::Directive(Directive::SetColor(Rgb::GREEN)),
            word("", Rgb::GREEN, true),
            word("after", Rgb::GREEN, false),
        ]
    );
}

#[test]
fn test_tokenizer_clear_keeps_color() {
    let mut t = MarkupTokenizer::new();
    t.feed("<font color=\"#FFFFFF\"/><clear/>");
    assert_eq!(t.color(), Rgb::WHITE);
}

#[test]
fn test_tokenizer_bad_color_keeps_color() {
    let mut t = MarkupTokenizer::new();
    let tokens = t.feed("<font color=\"#zz\"/>x");
    assert_eq!(
        tokens,
        vec![
            Token::Directive(Directive::Unrecognized),
            word("x", Rgb::RED, false),
        ]
    );
}

#[test]
fn test_tokenizer_reset() {
    let mut t = MarkupTokenizer::with_color(Rgb::WHITE);
    t.feed("<font color=\"#00FF00\"/>go <br");
    assert!(t.in_markup());
    t.reset();
    assert!(!t.in_markup());
    assert_eq!(t.pending(), "");
    assert_eq!(t.color(), Rgb::WHITE);
}

#[test]
fn test_token_pacing() {
    assert!(word("a", Rgb::RED, true).is_paced());
    assert!(!word("a-", Rgb::RED, false).is_paced());
    assert!(!Token::Directive(Directive::NewLine).is_paced());
}

// ============================================================================
// Geometry Tests
// ============================================================================

#[test]
fn test_geometry_pixel_canvas() {
    let g = Geometry::new(176, 208, 16);
    assert_eq!(g.margin(), 8);
    assert_eq!(g.left_margin(), 8);
    assert_eq!(g.right_margin(), 168);
    assert_eq!(g.capacity(), 12);
    assert_eq!(g.line_y(0), 8);
    assert_eq!(g.line_y(1), 24);
}

#[test]
fn test_geometry_cells() {
    let g = Geometry::cells(80, 24);
    assert_eq!(g.left_margin(), 4);
    assert_eq!(g.right_margin(), 76);
    assert_eq!(g.capacity(), 24);
    assert_eq!(g.line_y(0), 0);
    assert_eq!(g.line_y(23), 23);
}

#[test]
fn test_geometry_never_zero_lines() {
    assert_eq!(Geometry::new(100, 4, 16).capacity(), 1);
    assert_eq!(Geometry::new(100, 100, 0).line_height(), 1);
}

#[test]
fn test_geometry_vertical_margin_split_above_and_below() {
    let g = Geometry::cells(80, 24).with_vertical_margin(4);
    assert_eq!(g.capacity(), 20);
    assert_eq!(g.line_y(0), 2);
    // two blank rows left under the last line as well
    assert_eq!(g.line_y(19), 21);
}

// ============================================================================
// Run / Line Tests
// ============================================================================

#[test]
fn test_run_place_fits() {
    let mut run = Run::new(1, 19, Rgb::RED, true);
    assert_eq!(run.place(&Monospace::CELL, "Hello", true), Placement::Placed);
    assert_eq!(run.text(), "Hello ");
    assert_eq!(run.end_x(), 7);
}

#[test]
fn test_run_drops_space_at_margin() {
    let mut run = Run::new(1, 19, Rgb::RED, true);
    let exact = "abcdefghijklmnopqr";
    assert_eq!(run.place(&Monospace::CELL, exact, true), Placement::Placed);
    assert_eq!(run.text(), exact);
    assert_eq!(run.end_x(), 19);
}

#[test]
fn test_run_rejects_when_not_at_line_start() {
    let mut run = Run::new(10, 19, Rgb::RED, false);
    assert_eq!(
        run.place(&Monospace::CELL, "abcdefghijklmnopqrstuvwxyz", false),
        Placement::Rejected
    );
    assert!(run.is_empty());
}

#[test]
fn test_run_splits_at_line_start() {
    let mut run = Run::new(0, 4, Rgb::RED, true);
    assert_eq!(
        run.place(&Monospace::CELL, "abcdefg", true),
        Placement::Partial("efg".to_string())
    );
    assert_eq!(run.text(), "abcd");
}

#[test]
fn test_run_places_oversized_glyph_alone() {
    let mut run = Run::new(0, 4, Rgb::RED, true);
    assert_eq!(
        run.place(&Monospace::new(10), "ab", false),
        Placement::Partial("b".to_string())
    );
    assert_eq!(run.text(), "a");
}

#[test]
fn test_line_targets() {
    let mut line = Line::new(2, 38);
    assert_eq!(
        line.target_for(Rgb::RED),
        RunTarget::Open {
            start_x: 2,
            line_start: true
        }
    );

    line.place(&Monospace::CELL, "Hello", Rgb::RED, true);
    assert_eq!(line.target_for(Rgb::RED), RunTarget::Append(0));
    assert_eq!(
        line.target_for(Rgb::GREEN),
        RunTarget::Open {
            start_x: 8,
            line_start: false
        }
    );
}

#[test]
fn test_line_mixed_colors() {
    let mut line = Line::new(2, 38);
    line.place(&Monospace::CELL, "Hello", Rgb::RED, true);
    line.place(&Monospace::CELL, "there", Rgb::RED, true);
    line.place(&Monospace::CELL, "World", Rgb::GREEN, false);

    let runs = line.runs();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].text(), "Hello there ");
    assert_eq!(runs[1].text(), "World");
    assert_eq!(runs[1].start_x(), runs[0].end_x());
    assert_eq!(line.text(), "Hello there World");
}

#[test]
fn test_line_rejected_run_not_attached() {
    let mut line = Line::new(0, 10);
    line.place(&Monospace::CELL, "abcdefgh", Rgb::RED, true);
    assert_eq!(
        line.place(&Monospace::CELL, "xyz", Rgb::GREEN, false),
        Placement::Rejected
    );
    assert_eq!(line.runs().len(), 1);
}

// ============================================================================
// ScrollBuffer Tests
// ============================================================================

#[test]
fn test_scroll_buffer_starts_with_one_line() {
    let buf = ScrollBuffer::new(4, 0, 10);
    assert_eq!(buf.len(), 1);
    assert!(buf.current().is_empty());
    assert!(buf.get(1).is_none());
}

#[test]
fn test_scroll_buffer_discards_oldest() {
    let mut buf = ScrollBuffer::new(3, 0, 10);
    for label in ["a", "b", "c", "d"] {
        buf.current_mut().place(&Monospace::CELL, label, Rgb::RED, false);
        buf.push_line();
    }
    // 5 lines were created in total: a, b, c, d and the empty current.
    assert_eq!(buf.len(), 3);
    let texts: Vec<String> = buf.iter().map(Line::text).collect();
    assert_eq!(texts, vec!["c", "d", ""]);
    assert_eq!(buf.get(0).map(Line::text).as_deref(), Some("c"));
}

#[test]
fn test_scroll_buffer_capacity_one() {
    let mut buf = ScrollBuffer::new(0, 0, 10);
    assert_eq!(buf.capacity(), 1);
    buf.current_mut().place(&Monospace::CELL, "x", Rgb::RED, false);
    let dropped = buf.push_line();
    assert_eq!(dropped.map(|l| l.text()).as_deref(), Some("x"));
    assert_eq!(buf.len(), 1);
}

// ============================================================================
// LayoutEngine Tests
// ============================================================================

#[test]
fn test_layout_wraps_whole_words() {
    let mut layout = cells_layout(20, 5);
    layout.add_word("Hello", Rgb::RED, true);
    layout.add_word("abcdefghijklm", Rgb::RED, true);
    assert_eq!(line_texts(&layout), vec!["Hello ", "abcdefghijklm "]);
}

#[test]
fn test_layout_splits_overlong_word_without_loss() {
    let mut layout = cells_layout(20, 10);
    let long = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMN";
    layout.add_word(long, Rgb::RED, false);

    let texts = line_texts(&layout);
    assert!(texts.len() >= 2);
    assert_eq!(texts.concat(), long);
    assert_eq!(texts[0].len(), 18);
}

#[test]
fn test_layout_overlong_word_after_text_starts_new_line() {
    let mut layout = cells_layout(20, 10);
    layout.add_word("News", Rgb::RED, true);
    layout.add_word("abcdefghijklmnopqrstuvwxyz", Rgb::GREEN, false);
    let texts = line_texts(&layout);
    assert_eq!(texts[0], "News ");
    assert_eq!(texts[1..].concat(), "abcdefghijklmnopqrstuvwxyz");
}

#[test]
fn test_layout_scrolls_past_capacity() {
    let mut layout = cells_layout(20, 3);
    let labels = ["one", "two", "three", "four"];
    for (i, label) in labels.iter().enumerate() {
        if i > 0 {
            layout.new_line();
        }
        layout.add_word(label, Rgb::RED, false);
    }
    assert_eq!(layout.buffer().len(), 3);
    assert_eq!(line_texts(&layout), vec!["two", "three", "four"]);
}

#[test]
fn test_layout_new_line_on_empty_line() {
    let mut layout = cells_layout(20, 5);
    layout.new_line();
    layout.new_line();
    assert_eq!(layout.buffer().len(), 3);
}

#[test]
fn test_layout_clear() {
    let mut layout = cells_layout(20, 5);
    for w in ["a", "lot", "of", "text", "here"] {
        layout.add_word(w, Rgb::RED, true);
        layout.new_line();
    }
    layout.clear();
    assert_eq!(layout.buffer().len(), 1);
    assert!(layout.buffer().current().is_empty());
}

#[test]
fn test_layout_frame_rows() {
    let mut layout = LayoutEngine::new(Geometry::new(176, 208, 16), Monospace::new(8));
    layout.add_word("Hi", Rgb::RED, false);
    layout.new_line();
    layout.add_word("there", Rgb::GREEN, false);

    let frame = layout.frame();
    assert_eq!(frame.line_count(), 2);
    let rows: Vec<(u32, String)> = frame.rows().map(|(y, l)| (y, l.text())).collect();
    assert_eq!(rows, vec![(8, "Hi".to_string()), (24, "there".to_string())]);
}

// ============================================================================
// Ticker Tests
// ============================================================================

#[test]
fn test_ticker_paints_on_creation() {
    let ticker = Ticker::new(cells_layout(40, 5), RecordingSink::new(), unpaced());
    assert_eq!(ticker.sink().redraws, 1);
    assert_eq!(ticker.sink().texts(), vec![String::new()]);
}

#[test]
fn test_ticker_end_to_end() {
    let mut ticker = Ticker::new(cells_layout(40, 5), RecordingSink::new(), unpaced());
    ticker.ingest(b"Hello <font color=\"#00FF00\"/>World<br/>");
    assert_eq!(ticker.queued(), 4);
    assert_eq!(ticker.drain_now(), 4);

    let sink = ticker.sink();
    // creation + two words + line break; the color change paints nothing
    assert_eq!(sink.redraws, 4);
    assert_eq!(
        sink.lines,
        vec![
            vec![
                (Rgb::RED, "Hello ".to_string()),
                (Rgb::GREEN, "World".to_string())
            ],
            vec![],
        ]
    );
}

#[test]
fn test_ticker_clear_directive() {
    let mut ticker = Ticker::new(cells_layout(40, 5), RecordingSink::new(), unpaced());
    ticker.ingest(b"one<br/>two<br/>three<clear/>four");
    ticker.drain_now();
    assert_eq!(ticker.sink().texts(), vec!["four".to_string()]);
}

#[test]
fn test_ticker_initial_color() {
    let settings = TickerSettings {
        pacing: Duration::ZERO,
        initial_color: Rgb::WHITE,
    };
    let mut ticker = Ticker::new(cells_layout(40, 5), RecordingSink::new(), settings);
    ticker.ingest(b"plain");
    ticker.drain_now();
    assert_eq!(ticker.sink().lines[0], vec![(Rgb::WHITE, "plain".to_string())]);
}

#[test]
fn test_ticker_bytes_filtered_before_parsing() {
    let mut ticker = Ticker::new(cells_layout(40, 5), RecordingSink::new(), unpaced());
    ticker.ingest(b"caf\xc3\xa9\r\nnext");
    ticker.drain_now();
    assert_eq!(ticker.layout().buffer().current().text(), "caf next");
}

#[test]
fn test_ticker_reset_parser_drops_half_directive() {
    let mut ticker = Ticker::new(cells_layout(40, 5), NullSink, unpaced());
    ticker.ingest(b"text <font col");
    assert!(ticker.tokenizer().in_markup());
    ticker.reset_parser();
    assert!(!ticker.tokenizer().in_markup());
    ticker.ingest(b"after");
    ticker.drain_now();
    assert_eq!(ticker.layout().buffer().current().text(), "text after");
}

#[tokio::test(start_paused = true)]
async fn test_ticker_paces_spaced_words() {
    let settings = TickerSettings {
        pacing: Duration::from_millis(100),
        ..TickerSettings::default()
    };
    let mut ticker = Ticker::new(cells_layout(40, 5), NullSink, settings);
    ticker.ingest(b"one two well-known three");

    let start = tokio::time::Instant::now();
    ticker.drain().await;
    let elapsed = start.elapsed();

    // "one " "two " "known " are paced; "well-" and "three" are not.
    assert!(elapsed >= Duration::from_millis(300), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(400), "{elapsed:?}");
    assert_eq!(ticker.queued(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_ticker_run_consumes_events() {
    let (tx, rx) = mpsc::channel(8);
    let ticker = Ticker::new(cells_layout(40, 5), RecordingSink::new(), TickerSettings::default());

    tx.send(FeedEvent::Connected("feed:1".into())).await.unwrap();
    tx.send(FeedEvent::Data(b"Breaking <br".to_vec())).await.unwrap();
    // The half directive is dropped when the feed reconnects.
    tx.send(FeedEvent::Disconnected("reset".into())).await.unwrap();
    tx.send(FeedEvent::Connected("feed:1".into())).await.unwrap();
    tx.send(FeedEvent::Data(b"news".to_vec())).await.unwrap();
    drop(tx);

    let ticker = ticker.run(rx).await;
    assert_eq!(ticker.sink().texts(), vec!["Breaking news".to_string()]);
}

// ============================================================================
// RenderSink Tests
// ============================================================================

struct CountingSink(usize);

impl RenderSink for CountingSink {
    fn redraw(&mut self, frame: &Frame<'_>) {
        self.0 += frame.line_count();
    }
}

#[test]
fn test_render_sink_through_box_and_ref() {
    let mut counting = CountingSink(0);
    {
        let mut ticker = Ticker::new(cells_layout(40, 5), &mut counting, unpaced());
        ticker.ingest(b"a<br/>b");
        ticker.drain_now();
    }
    // frames with 1, 1, 2, 2 lines
    assert_eq!(counting.0, 6);

    let boxed: Box<dyn RenderSink + Send> = Box::new(NullSink);
    let mut ticker = Ticker::new(cells_layout(40, 5), boxed, unpaced());
    ticker.ingest(b"fine");
    assert_eq!(ticker.drain_now(), 1);
}

// ============================================================================
// TickerEngine Tests
// ============================================================================

#[derive(Default)]
struct ScriptedSource {
    reads: VecDeque<Vec<u8>>,
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
}

#[async_trait]
impl ByteSource for ScriptedSource {
    async fn connect(&mut self, _address: &str) -> bool {
        true
    }

    async fn read_available(&mut self) -> Result<Vec<u8>, FeedError> {
        match self.reads.pop_front() {
            Some(bytes) => Ok(bytes),
            None => std::future::pending().await,
        }
    }

    async fn disconnect(&mut self) {}

    async fn send(&mut self, data: &[u8]) -> bool {
        self.sent.lock().unwrap().push(data.to_vec());
        true
    }
}

/// Forwards each frame's text so the test can wait for it.
struct ChannelSink(mpsc::UnboundedSender<Vec<String>>);

impl RenderSink for ChannelSink {
    fn redraw(&mut self, frame: &Frame<'_>) {
        let texts = frame.rows().map(|(_, line)| line.text()).collect();
        let _ = self.0.send(texts);
    }
}

#[tokio::test]
async fn test_engine_end_to_end() {
    let source = ScriptedSource {
        reads: VecDeque::from([b"Hello ".to_vec(), b"World".to_vec()]),
        ..Default::default()
    };
    let sent = source.sent.clone();

    let (frame_tx, mut frame_rx) = mpsc::unbounded_channel();
    let ticker = Ticker::new(cells_layout(40, 5), ChannelSink(frame_tx), unpaced());
    let engine = TickerEngine::start(source, "feed:9", ReconnectPolicy::default(), ticker);
    assert_eq!(engine.address(), "feed:9");

    let wait = async {
        while let Some(texts) = frame_rx.recv().await {
            if texts == vec!["Hello World".to_string()] {
                return true;
            }
        }
        false
    };
    assert!(tokio::time::timeout(Duration::from_secs(5), wait).await.unwrap());

    assert!(engine.send(b"ack").await);
    assert_eq!(sent.lock().unwrap().as_slice(), &[b"ack".to_vec()]);

    let ticker = engine.shutdown().await.unwrap();
    assert_eq!(ticker.layout().buffer().current().text(), "Hello World");
}

#[tokio::test(start_paused = true)]
async fn test_engine_shutdown_within_aborts_slow_drain() {
    let many_words = "word ".repeat(50);
    let source = ScriptedSource {
        reads: VecDeque::from([many_words.into_bytes()]),
        ..Default::default()
    };

    let (frame_tx, mut frame_rx) = mpsc::unbounded_channel();
    // 50 paced words at 100 ms take 5 s to show
    let ticker = Ticker::new(cells_layout(40, 5), ChannelSink(frame_tx), TickerSettings::default());
    let engine = TickerEngine::start(source, "feed:10", ReconnectPolicy::default(), ticker);

    // wait until the first word is on screen
    while let Some(texts) = frame_rx.recv().await {
        if texts.concat().contains("word") {
            break;
        }
    }

    let result = engine.shutdown_within(Duration::from_millis(250)).await.unwrap();
    assert!(result.is_none());

    // The task is gone: whatever was painted is buffered and nothing more comes.
    let mut later_frames = 0;
    loop {
        match frame_rx.try_recv() {
            Ok(_) => later_frames += 1,
            Err(mpsc::error::TryRecvError::Disconnected) => break,
            Err(mpsc::error::TryRecvError::Empty) => panic!("ticker still running"),
        }
    }
    assert!(later_frames < 49, "{later_frames} frames after the first word");
}

#[tokio::test]
async fn test_engine_shutdown_within_returns_drained_ticker() {
    let source = ScriptedSource {
        reads: VecDeque::from([b"quick".to_vec()]),
        ..Default::default()
    };

    let (frame_tx, mut frame_rx) = mpsc::unbounded_channel();
    let ticker = Ticker::new(cells_layout(40, 5), ChannelSink(frame_tx), unpaced());
    let engine = TickerEngine::start(source, "feed:11", ReconnectPolicy::default(), ticker);

    let wait = async {
        while let Some(texts) = frame_rx.recv().await {
            if texts == vec!["quick".to_string()] {
                return;
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(5), wait).await.unwrap();

    let ticker = engine
        .shutdown_within(Duration::from_secs(5))
        .await
        .unwrap()
        .expect("drained within the grace period");
    assert_eq!(ticker.layout().buffer().current().text(), "quick");
}
