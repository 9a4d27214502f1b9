fn main() {
    vibesync_lib::run()
}
