use colored::Colorize;

pub fn handle() {
    let registry = provisio_kinds::default_registry();

    println!("{}", "対応しているリソース種別:".bold());
    for kind in registry.kinds() {
        println!("  {}", kind.as_str().cyan());
    }
}
