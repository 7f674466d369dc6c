/// Parse de algo como: [1, 3, 224, 224]
pub fn parse_usize_list(text: &str) -> Result<Vec<usize>, String> {
    let inner = text.trim();
    if !inner.starts_with('[') || !inner.ends_with(']') {
        return Err(format!("Expected [d1, d2, ...], got: {}", text));
    }
    let inner = &inner[1..inner.len() - 1]; // sin [ ]
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    for part in inner.split(',') {
        let p = part.trim();
        let n: usize = p.parse().map_err(|_| format!("Invalid dimension: {}", p))?;
        out.push(n);
    }
    Ok(out)
}

/// Shape argument for the CLI: `[2, 3]` or the bare form `2,3`
pub fn parse_shape(text: &str) -> Result<crate::core::tensor::Shape, String> {
    let trimmed = text.trim();
    let dims = if trimmed.starts_with('[') {
        parse_usize_list(trimmed)?
    } else {
        parse_usize_list(&format!("[{}]", trimmed))?
    };
    Ok(crate::core::tensor::Shape::new(dims))
}
