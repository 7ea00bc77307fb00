#[macro_export]
macro_rules! bad_token {
    ($s:expr, $t:expr) => {{
        anyhow::bail!("unexpected token {:?} `{}`", $t, $s)
    }};
    ($s:expr, $t:expr, $msg:expr) => {{
        anyhow::bail!("unexpected token {:?} `{}` {}", $t, $s, $msg)
    }};
}
#[macro_export]
macro_rules! assert_token_matches {
    ($l:expr, $e:pat) => {{
        let __token = $l.next_res()?;
        if !matches!(__token.1, $e) {
            anyhow::bail!(
                "expected {} but found {:?} `{}`",
                stringify!($e),
                __token.1,
                __token.0,
            );
        }
    }};
}
