//! Inputs for the parser benchmarks.

const BLOCK: &str = r#"
$accent-#{$i}: #ff0099;

@mixin respond-#{$i}($name) {
  @media (min-width: map-get($breakpoints, $name)) { @content; }
}

.card-#{$i} {
  padding: .5rem 1rem;
  // spacing
  margin: 0 auto;
  &:not(.disabled):hover, &.active {
    background: darken($accent, 10%) !important;
  }
  > .title + .body ~ span { color: rgba(0, 0, 0, .8) }
  [data-state="open"] & { opacity: 1 }
  /* nested property */
  font: {
    family: 'Helvetica', sans-serif;
    size: math.div(14px, 16px) * 1rem;
  }
  @include respond-#{$i}(medium) { padding: 1rem 2rem; }
}
"#;

/// A stylesheet made of `n` copies of a block that touches every node kind.
pub fn synthetic_stylesheet(n: usize) -> String {
    let mut out = String::with_capacity(BLOCK.len() * n);
    for i in 0..n {
        out.push_str(&BLOCK.replace("#{$i}", &i.to_string()));
    }
    out
}
