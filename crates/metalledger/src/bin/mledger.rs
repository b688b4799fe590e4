//! mledger - Track metal stock by purchase lot, book sales and keep party balances.

fn main() -> std::process::ExitCode {
    metalledger::cmd::main()
}
