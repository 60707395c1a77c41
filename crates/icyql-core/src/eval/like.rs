/// SQL `LIKE` with `\` as the escape character.
///
/// `%` matches any run of characters, `_` exactly one.
#[must_use]
pub fn like_match(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern = tokenize(pattern);

    // matched[j]: pattern[..i] matches text[..j]
    let mut matched = vec![false; text.len() + 1];
    matched[0] = true;

    for token in &pattern {
        let mut next = vec![false; text.len() + 1];
        match token {
            Token::AnyRun => {
                let mut reachable = false;
                for (slot, &hit) in next.iter_mut().zip(&matched) {
                    reachable |= hit;
                    *slot = reachable;
                }
            }
            Token::AnyOne => {
                next[1..].copy_from_slice(&matched[..text.len()]);
            }
            Token::Literal(c) => {
                for (j, &t) in text.iter().enumerate() {
                    next[j + 1] = matched[j] && t == *c;
                }
            }
        }
        matched = next;
    }

    matched[text.len()]
}

enum Token {
    AnyRun,
    AnyOne,
    Literal(char),
}

fn tokenize(pattern: &str) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(pattern.len());
    let mut chars = pattern.chars();

    while let Some(c) = chars.next() {
        tokens.push(match c {
            '%' => Token::AnyRun,
            '_' => Token::AnyOne,
            // A trailing escape matches itself.
            '\\' => Token::Literal(chars.next().unwrap_or('\\')),
            other => Token::Literal(other),
        });
    }

    tokens
}
