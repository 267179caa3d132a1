//! Event-based parser.
//!
//! Parse functions call `open()` to start a node, `advance()` to consume
//! tokens and `close()` to finish a node with its kind. Events are collected
//! into a flat `Vec<Event>` and turned into a rowan `GreenNode` by
//! `build_tree()`. `open_before()` wraps an already-completed node (turning
//! `f` into `call_expr(f, arg_list)`) through a forward-parent link.
//!
//! Errors are recovered at statement granularity: the first error inside a
//! statement is recorded, later ones are suppressed until the statement list
//! resynchronizes on `;`, `}` or end of input.

pub(crate) mod expressions;
pub(crate) mod statements;

use tbind_common::span::Span;
use tbind_common::token::Token;

use crate::error::ParseError;
use crate::syntax_kind::SyntaxKind;

#[derive(Debug)]
enum Event {
    /// Start a node. `kind` is TOMBSTONE until `close()` patches it.
    Open {
        kind: SyntaxKind,
        forward_parent: Option<usize>,
    },
    Close,
    Advance,
}

/// A started but not yet closed node.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MarkOpened {
    index: usize,
}

/// A completed node, usable with [`Parser::open_before`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct MarkClosed {
    index: usize,
}

pub(crate) struct Parser<'src> {
    tokens: Vec<Token>,
    pos: usize,
    events: Vec<Event>,
    source: &'src str,
    errors: Vec<ParseError>,
    /// Set by the first error in a statement; cleared on resynchronization.
    recovering: bool,
    /// Nonzero while parsing the head of a `for (...)` statement.
    for_header_depth: u32,
    /// Kind of the last significant token consumed.
    last: SyntaxKind,
}

impl<'src> Parser<'src> {
    pub(crate) fn new(tokens: Vec<Token>, source: &'src str) -> Self {
        Self {
            tokens,
            pos: 0,
            events: Vec::new(),
            source,
            errors: Vec::new(),
            recovering: false,
            for_header_depth: 0,
            last: SyntaxKind::EOF,
        }
    }

    // ── Lookahead ──────────────────────────────────────────────────────

    pub(crate) fn current(&self) -> SyntaxKind {
        self.nth(0)
    }

    /// Kind of the `n`th significant token ahead, skipping comments.
    pub(crate) fn nth(&self, n: usize) -> SyntaxKind {
        self.significant_index(n)
            .map(|i| SyntaxKind::from(self.tokens[i].kind))
            .unwrap_or(SyntaxKind::EOF)
    }

    pub(crate) fn nth_text(&self, n: usize) -> &'src str {
        match self.significant_index(n) {
            Some(i) => &self.source[self.tokens[i].span.range()],
            None => "",
        }
    }

    pub(crate) fn current_span(&self) -> Span {
        match self.significant_index(0) {
            Some(i) => self.tokens[i].span,
            None => Span::point(self.source.len() as u32),
        }
    }

    pub(crate) fn at(&self, kind: SyntaxKind) -> bool {
        self.current() == kind
    }

    pub(crate) fn at_any(&self, kinds: &[SyntaxKind]) -> bool {
        kinds.contains(&self.current())
    }

    /// Given an opening delimiter at significant offset `n`, return the
    /// significant offset just past its matching closer (or the offset of
    /// end of input when it is never closed).
    pub(crate) fn skip_balanced(&self, n: usize) -> usize {
        let mut depth = 0u32;
        let mut offset = n;
        loop {
            match self.nth(offset) {
                SyntaxKind::EOF => return offset,
                SyntaxKind::L_PAREN | SyntaxKind::L_BRACKET | SyntaxKind::L_BRACE => depth += 1,
                SyntaxKind::R_PAREN | SyntaxKind::R_BRACKET | SyntaxKind::R_BRACE => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return offset + 1;
                    }
                }
                _ => {}
            }
            offset += 1;
        }
    }

    fn significant_index(&self, n: usize) -> Option<usize> {
        let mut remaining = n;
        let mut i = self.pos;
        while i < self.tokens.len() {
            if !self.tokens[i].kind.is_trivia() {
                if remaining == 0 {
                    return Some(i);
                }
                remaining -= 1;
            }
            i += 1;
        }
        None
    }

    // ── Node management ────────────────────────────────────────────────

    /// Start a node. Pending trivia is consumed first so it stays in the
    /// parent rather than leading the new node.
    pub(crate) fn open(&mut self) -> MarkOpened {
        self.eat_trivia();
        self.open_here()
    }

    fn open_here(&mut self) -> MarkOpened {
        let mark = MarkOpened {
            index: self.events.len(),
        };
        self.events.push(Event::Open {
            kind: SyntaxKind::TOMBSTONE,
            forward_parent: None,
        });
        mark
    }

    /// Start a node that becomes the parent of an already-completed node.
    pub(crate) fn open_before(&mut self, completed: MarkClosed) -> MarkOpened {
        let mark = self.open_here();
        if let Event::Open { forward_parent, .. } = &mut self.events[completed.index] {
            *forward_parent = Some(mark.index);
        }
        mark
    }

    /// Kind a completed node was closed with.
    pub(crate) fn kind_of(&self, m: MarkClosed) -> SyntaxKind {
        match self.events[m.index] {
            Event::Open { kind, .. } => kind,
            _ => SyntaxKind::TOMBSTONE,
        }
    }

    pub(crate) fn close(&mut self, m: MarkOpened, kind: SyntaxKind) -> MarkClosed {
        if let Event::Open { kind: slot, .. } = &mut self.events[m.index] {
            *slot = kind;
        }
        self.events.push(Event::Close);
        MarkClosed { index: m.index }
    }

    // ── Token consumption ──────────────────────────────────────────────

    /// Consume the current significant token along with any trivia before it.
    pub(crate) fn advance(&mut self) {
        self.eat_trivia();
        if self.pos < self.tokens.len() {
            self.last = SyntaxKind::from(self.tokens[self.pos].kind);
            self.events.push(Event::Advance);
            self.pos += 1;
        }
    }

    fn eat_trivia(&mut self) {
        while self.pos < self.tokens.len() && self.tokens[self.pos].kind.is_trivia() {
            self.events.push(Event::Advance);
            self.pos += 1;
        }
    }

    /// Consume the current token wrapped in an ERROR_NODE.
    pub(crate) fn advance_with_error(&mut self, message: &str) {
        let m = self.open();
        self.error(message);
        self.advance();
        self.close(m, SyntaxKind::ERROR_NODE);
    }

    pub(crate) fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, kind: SyntaxKind) -> bool {
        if self.eat(kind) {
            true
        } else {
            self.error(&format!("expected {}", describe(kind)));
            false
        }
    }

    /// Expect a closing delimiter, pointing back at its opener on failure.
    pub(crate) fn expect_closing(&mut self, kind: SyntaxKind, opened_at: Span) -> bool {
        if self.eat(kind) {
            return true;
        }
        if !self.recovering {
            let span = self.current_span();
            self.errors.push(ParseError::with_related(
                format!("expected {}", describe(kind)),
                span,
                "opened here",
                opened_at,
            ));
            self.recovering = true;
        }
        false
    }

    /// Number of tokens consumed so far, for progress checks.
    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    // ── Errors ─────────────────────────────────────────────────────────

    /// Record an error at the current token unless one was already
    /// recorded for this statement.
    pub(crate) fn error(&mut self, message: &str) {
        if self.recovering {
            return;
        }
        let span = self.current_span();
        self.errors.push(ParseError::new(message, span));
        self.recovering = true;
    }

    /// Skip to a statement boundary after an error.
    pub(crate) fn recover(&mut self) {
        if !self.recovering {
            return;
        }
        if matches!(self.last, SyntaxKind::SEMICOLON | SyntaxKind::R_BRACE) {
            self.recovering = false;
            return;
        }
        if !self.at_any(&[SyntaxKind::SEMICOLON, SyntaxKind::R_BRACE, SyntaxKind::EOF]) {
            let m = self.open();
            while !self.at_any(&[SyntaxKind::SEMICOLON, SyntaxKind::R_BRACE, SyntaxKind::EOF]) {
                if self.at_any(&[SyntaxKind::L_PAREN, SyntaxKind::L_BRACKET, SyntaxKind::L_BRACE]) {
                    let end = self.skip_balanced(0);
                    for _ in 0..end {
                        self.advance();
                    }
                } else {
                    self.advance();
                }
            }
            self.close(m, SyntaxKind::ERROR_NODE);
        }
        self.eat(SyntaxKind::SEMICOLON);
        self.recovering = false;
    }

    // ── Context ────────────────────────────────────────────────────────

    pub(crate) fn in_for_header(&self) -> bool {
        self.for_header_depth > 0
    }

    pub(crate) fn enter_for_header(&mut self) {
        self.for_header_depth += 1;
    }

    pub(crate) fn exit_for_header(&mut self) {
        self.for_header_depth = self.for_header_depth.saturating_sub(1);
    }

    /// Run `f` with the for-header flag cleared, for nested function bodies
    /// and parenthesized sub-expressions.
    pub(crate) fn outside_for_header<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = std::mem::take(&mut self.for_header_depth);
        let result = f(self);
        self.for_header_depth = saved;
        result
    }

    // ── Tree building ──────────────────────────────────────────────────

    /// Convert the events into a green tree.
    ///
    /// Source gaps between tokens become WHITESPACE tokens. A gap in front
    /// of a node's first token is emitted before the node starts, so nodes
    /// begin at their first real token and the tree text is the source text.
    ///
    /// An Open with a forward parent starts the whole chain of wrappers,
    /// outermost first; the wrappers' own Open events are then tombstoned
    /// so they are skipped when reached.
    pub(crate) fn build_tree(mut self) -> (rowan::GreenNode, Vec<ParseError>) {
        let mut sink = TreeSink {
            builder: rowan::GreenNodeBuilder::new(),
            source: self.source,
            text_end: 0,
            depth: 0,
        };
        let mut token_pos = 0usize;
        let mut chain: Vec<SyntaxKind> = Vec::new();

        for i in 0..self.events.len() {
            let next_start = self.tokens.get(token_pos).map(|t| t.span.start);
            match self.events[i] {
                Event::Open {
                    kind,
                    forward_parent: None,
                } => {
                    if kind != SyntaxKind::TOMBSTONE {
                        sink.start_node(kind, next_start);
                    }
                }
                Event::Open {
                    forward_parent: Some(_),
                    ..
                } => {
                    chain.clear();
                    let mut current = Some(i);
                    while let Some(idx) = current {
                        let Event::Open {
                            kind,
                            forward_parent,
                        } = &mut self.events[idx]
                        else {
                            break;
                        };
                        chain.push(*kind);
                        current = forward_parent.take();
                        if idx != i {
                            *kind = SyntaxKind::TOMBSTONE;
                        }
                    }
                    for kind in chain.iter().rev() {
                        if *kind != SyntaxKind::TOMBSTONE {
                            sink.start_node(*kind, next_start);
                        }
                    }
                }
                Event::Close => sink.finish_node(),
                Event::Advance => {
                    if let Some(token) = self.tokens.get(token_pos) {
                        sink.token(token);
                        token_pos += 1;
                    }
                }
            }
        }

        (sink.builder.finish(), self.errors)
    }
}

/// Green-tree builder that fills whitespace gaps from the source.
struct TreeSink<'src> {
    builder: rowan::GreenNodeBuilder<'static>,
    source: &'src str,
    text_end: u32,
    depth: usize,
}

impl TreeSink<'_> {
    fn gap(&mut self, upto: u32) {
        if upto > self.text_end {
            self.builder.token(
                rowan::SyntaxKind(SyntaxKind::WHITESPACE as u16),
                &self.source[self.text_end as usize..upto as usize],
            );
            self.text_end = upto;
        }
    }

    fn start_node(&mut self, kind: SyntaxKind, next_start: Option<u32>) {
        // The root has no parent to hold leading whitespace.
        if self.depth > 0 {
            if let Some(start) = next_start {
                self.gap(start);
            }
        }
        self.builder.start_node(rowan::SyntaxKind(kind as u16));
        self.depth += 1;
    }

    fn finish_node(&mut self) {
        self.builder.finish_node();
        self.depth -= 1;
    }

    fn token(&mut self, token: &Token) {
        self.gap(token.span.start);
        let kind = SyntaxKind::from(token.kind);
        self.builder
            .token(rowan::SyntaxKind(kind as u16), &self.source[token.span.range()]);
        self.text_end = token.span.end;
    }
}

/// Human-readable name of a token kind for error messages.
pub(crate) fn describe(kind: SyntaxKind) -> &'static str {
    match kind {
        SyntaxKind::L_PAREN => "`(`",
        SyntaxKind::R_PAREN => "`)`",
        SyntaxKind::L_BRACKET => "`[`",
        SyntaxKind::R_BRACKET => "`]`",
        SyntaxKind::L_BRACE => "`{`",
        SyntaxKind::R_BRACE => "`}`",
        SyntaxKind::SEMICOLON => "`;`",
        SyntaxKind::COLON => "`:`",
        SyntaxKind::COMMA => "`,`",
        SyntaxKind::EQ => "`=`",
        SyntaxKind::FAT_ARROW => "`=>`",
        SyntaxKind::IDENT => "identifier",
        SyntaxKind::WHILE_KW => "`while`",
        SyntaxKind::INTERPOLATION_END => "`}` to close the interpolation",
        SyntaxKind::TEMPLATE_END => "closing backtick",
        SyntaxKind::EOF => "end of input",
        _ => "token",
    }
}

/// Parse a complete source file.
pub(crate) fn parse_source_file(p: &mut Parser) {
    let root = p.open_here();
    while !p.at(SyntaxKind::EOF) {
        if p.at(SyntaxKind::R_BRACE) {
            p.advance_with_error("unmatched `}`");
            p.recover();
            continue;
        }
        statements::stmt_in_list(p);
    }
    // Trailing trivia and the EOF token.
    p.advance();
    p.close(root, SyntaxKind::SOURCE_FILE);
}
