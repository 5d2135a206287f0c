mod utils;

use proc_macro::{Delimiter, Group, TokenStream, TokenTree};

/// Joins tasks into a task of a tuple of their values.
///
/// `join!(a, b, c)` resolves to `(va, vb, vc)` once every task succeeds,
/// or fails with the first failure observed. A single task is returned as
/// is, and `join!()` is an already resolved `Task<()>`.
#[proc_macro]
pub fn join(input: TokenStream) -> TokenStream {
    let args = utils::split_args(input);
    let count = args.len();

    if count == 0 {
        return expand("::strand::task::Task::ready(())", "join");
    }

    if count == 1 {
        return expand(&format!("{{ {} }}", utils::tokens_to_string(&args[0])), "join");
    }

    let mut output = String::new();
    output.push_str("{\n");

    for (i, expr_tokens) in args.iter().enumerate() {
        let idx = i + 1;
        let expr = utils::tokens_to_string(expr_tokens);
        output.push_str(&format!("let __t{idx} = {expr};\n"));
    }

    output.push_str("__t1");
    for i in 2..=count {
        output.push_str(&format!(".zip(&__t{i})"));
    }

    if count > 2 {
        let mut pattern = String::from("__v1");
        for i in 2..=count {
            pattern = format!("({pattern}, __v{i})");
        }

        let values = (1..=count)
            .map(|i| format!("__v{i}"))
            .collect::<Vec<_>>()
            .join(", ");

        output.push_str(&format!(".map(|{pattern}| ({values}))"));
    }

    output.push_str("\n}\n");

    expand(&output, "join")
}

/// Runs `main` with a thread pool.
///
/// The body sees an `executor` binding of type `strand::Executor`. The pool
/// is drained and stopped once the body returns. Accepts
/// `worker_threads = N`.
#[proc_macro_attribute]
pub fn main(attr: TokenStream, item: TokenStream) -> TokenStream {
    let builder = pool_builder(&attr.to_string());

    wrap_body(item, |block| {
        format!(
            "{{
                let __strand_pool = {builder}.expect(\"failed to build thread pool\");
                #[allow(unused_variables)]
                let executor = __strand_pool.executor().clone();
                let __strand_output = {{ {block} }};
                drop(__strand_pool);
                __strand_output
            }}"
        )
    })
}

/// Runs a test with a thread pool.
///
/// Same as [`main`](macro@main), and marks the function as `#[test]`.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    let expanded = main(attr, item);

    let test_attr: TokenStream = "#[test]".parse().unwrap_or_default();
    let mut result: Vec<TokenTree> = test_attr.into_iter().collect();
    result.extend(expanded);

    result.into_iter().collect()
}

/// Builds the `ThreadPoolBuilder` expression for the attribute arguments.
fn pool_builder(attr: &str) -> String {
    let mut builder = String::from("::strand::ThreadPoolBuilder::new()");

    for part in attr.split(',') {
        let part = part.trim();
        if let Some(v) = part.strip_prefix("worker_threads") {
            let v = v.trim_start_matches(|c: char| c == '=' || c.is_whitespace());
            if let Ok(n) = v.parse::<usize>() {
                builder.push_str(&format!(".worker_threads({n})"));
            }
        }
    }

    builder.push_str(".build()");
    builder
}

/// Replaces the body of the function in `item` with `wrap(body)`.
fn wrap_body(item: TokenStream, wrap: impl FnOnce(String) -> String) -> TokenStream {
    let mut tokens: Vec<TokenTree> = item.into_iter().collect();

    let Some(pos) = tokens
        .iter()
        .rposition(|t| matches!(t, TokenTree::Group(g) if g.delimiter() == Delimiter::Brace))
    else {
        return expand("compile_error!(\"expected a function body\");", "attribute");
    };

    let TokenTree::Group(body) = &tokens[pos] else {
        return TokenStream::new();
    };

    let block = wrap(body.stream().to_string());

    match block.parse() {
        Ok(stream) => tokens[pos] = TokenTree::Group(Group::new(Delimiter::Brace, stream)),
        Err(err) => return expand(&format!("compile_error!(\"{err}\");"), "attribute"),
    }

    tokens.into_iter().collect()
}

/// Parses generated code, turning a parse failure into a `compile_error!`.
fn expand(code: &str, name: &str) -> TokenStream {
    code.parse().unwrap_or_else(|err| {
        let msg = format!("{name} macro error: {err}").replace('"', "'");
        format!("compile_error!(\"{msg}\");")
            .parse()
            .unwrap_or_default()
    })
}
