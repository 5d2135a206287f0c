use proc_macro::{TokenStream, TokenTree};

/// Splits macro input on its top-level commas.
///
/// Parenthesized, bracketed and braced groups arrive as single
/// [`TokenTree::Group`] tokens, so commas inside a closure call or a tuple
/// never split an argument. Empty arguments, such as the one after a
/// trailing comma, are skipped.
pub(crate) fn split_args(input: TokenStream) -> Vec<Vec<TokenTree>> {
    let mut args = vec![Vec::new()];

    for token in input {
        match &token {
            TokenTree::Punct(p) if p.as_char() == ',' => args.push(Vec::new()),
            _ => {
                if let Some(last) = args.last_mut() {
                    last.push(token);
                }
            }
        }
    }

    args.retain(|arg| !arg.is_empty());
    args
}

/// Renders one argument back to source text for the string-built expansions.
///
/// Adjacent identifiers are separated by a space so that `move x` does not
/// come out as `movex`; all other tokens are concatenated.
pub(crate) fn tokens_to_string(tokens: &[TokenTree]) -> String {
    let mut out = String::new();

    for (i, token) in tokens.iter().enumerate() {
        let glued = i > 0
            && matches!(tokens[i - 1], TokenTree::Ident(_))
            && matches!(token, TokenTree::Ident(_));

        if glued {
            out.push(' ');
        }
        out.push_str(&token.to_string());
    }

    out
}
